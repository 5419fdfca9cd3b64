//! Packed pixel upload command

use indicatif::{ProgressBar, ProgressStyle};
use it8951_core::bus::HostBus;
use it8951_core::transport::FramedTransport;
use it8951_core::Error;
use std::path::Path;

/// Bytes handed to the transport per progress update (must stay even)
const UPLOAD_CHUNK_SIZE: usize = 4096;

/// Run the write-pixels command
pub fn run_write_pixels<B: HostBus>(
    transport: &mut FramedTransport<B>,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    if data.len() % 2 != 0 {
        return Err(Error::OddPixelCount(data.len()).into());
    }

    println!("Uploading {} bytes from {:?}", data.len(), input);
    write_pixels_with_progress(transport, &data)?;
    println!("Wrote {} pixel byte pairs", data.len() / 2);

    Ok(())
}

/// Upload packed pixel bytes with a progress bar
///
/// Chunking only affects progress reporting; each byte pair is still its
/// own frame on the wire.
pub fn write_pixels_with_progress<B: HostBus>(
    transport: &mut FramedTransport<B>,
    data: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(data.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
            .progress_chars("#>-"),
    );

    for chunk in data.chunks(UPLOAD_CHUNK_SIZE) {
        transport.write_packed_pixel_bytes(chunk)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_with_message("Upload complete");
    Ok(())
}
