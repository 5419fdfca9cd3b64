//! Word read/write and command commands

use it8951_core::bus::HostBus;
use it8951_core::transport::FramedTransport;

/// Run the write-words command
pub fn run_write_words<B: HostBus>(
    transport: &mut FramedTransport<B>,
    preamble: u16,
    words: &[u16],
) -> Result<(), Box<dyn std::error::Error>> {
    transport.write_words(preamble, words)?;
    println!(
        "Wrote {} word(s) with preamble 0x{:04X}",
        words.len(),
        preamble
    );
    Ok(())
}

/// Run the read-words command
pub fn run_read_words<B: HostBus>(
    transport: &mut FramedTransport<B>,
    preamble: u16,
    count: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let values = transport.read_words_vec(preamble, count)?;
    println!("{}", format_words(&values));
    Ok(())
}

/// Run the command command
pub fn run_command<B: HostBus>(
    transport: &mut FramedTransport<B>,
    code: u16,
    args: &[u16],
) -> Result<(), Box<dyn std::error::Error>> {
    transport.send_command_with_args(code, args)?;
    println!("Sent command 0x{:04X} with {} argument(s)", code, args.len());
    Ok(())
}

/// Format words as rows of eight hex values
fn format_words(values: &[u16]) -> String {
    values
        .chunks(8)
        .enumerate()
        .map(|(row, chunk)| {
            let cols: Vec<String> = chunk.iter().map(|v| format!("{:04X}", v)).collect();
            format!("{:04}: {}", row * 8, cols.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_words() {
        let values: Vec<u16> = (0..10).map(|i| i * 0x0101).collect();
        assert_eq!(
            format_words(&values),
            "0000: 0000 0101 0202 0303 0404 0505 0606 0707\n0008: 0808 0909"
        );
        assert_eq!(format_words(&[]), "");
    }

    #[cfg(feature = "sim")]
    #[test]
    fn test_write_then_read_on_sim() {
        use it8951_core::preamble;
        use it8951_sim::SimBus;

        let mut transport = FramedTransport::new(SimBus::loopback());
        run_write_words(&mut transport, preamble::WRITE_DATA, &[0x1111, 0x2222]).unwrap();
        run_read_words(&mut transport, preamble::READ_DATA, 2).unwrap();
        assert_eq!(transport.bus().fifo().count(), 0);
    }
}
