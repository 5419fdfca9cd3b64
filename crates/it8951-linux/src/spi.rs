//! spidev byte channel
//!
//! Opens `/dev/spidevX.Y` in mode 0, MSB first, 8 bits per word, with the
//! kernel's chip-select disabled (`SPI_NO_CS`). Chip-select is driven as a
//! plain GPIO by [`crate::gpio::HostLines`] so it can stay asserted across
//! the many single-byte transfers of one frame.

use crate::error::{LinuxHostError, Result};

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

/// BCM2835 core clock feeding the SPI divider
pub const BCM2835_CORE_CLOCK_HZ: u32 = 250_000_000;

/// Clock divider used by the reference wiring (250 MHz / 32 = 7.8125 MHz)
pub const DEFAULT_CLOCK_DIVIDER: u32 = 32;

/// Default SPI clock speed in Hz
pub const DEFAULT_SPEED_HZ: u32 = BCM2835_CORE_CLOCK_HZ / DEFAULT_CLOCK_DIVIDER;

/// SPI mode bits
pub mod mode {
    /// SPI mode 0: CPOL=0, CPHA=0
    pub const MODE_0: u8 = 0;
    /// Do not let the controller drive chip-select
    pub const NO_CS: u8 = 0x40;
}

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    // SPI ioctl magic number
    const SPI_IOC_MAGIC: u8 = b'k';

    // SPI ioctl type numbers
    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_LSB_FIRST: u8 = 2;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_lsb_first,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_LSB_FIRST,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    /// Size of spi_ioc_transfer struct
    ///
    /// The same on 32-bit ARM: the kernel declares the buffer pointers as
    /// `__u64`, so the layout does not depend on pointer width, and the
    /// 30 bytes of fields round up to the alignment of `u64` (8 on ARM).
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// Calculate ioctl number for SPI_IOC_MESSAGE(n)
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        // _IOW = _IOC(_IOC_WRITE, type, nr, size)
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// SPI transfer structure for ioctl
/// This must match the kernel's struct spi_ioc_transfer layout.
/// Buffer pointers are widened to `u64` on 32-bit hosts as the kernel expects.
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,          // __u64 tx_buf
    rx_buf: u64,          // __u64 rx_buf
    len: u32,             // __u32 len
    speed_hz: u32,        // __u32 speed_hz
    delay_usecs: u16,     // __u16 delay_usecs
    bits_per_word: u8,    // __u8 bits_per_word
    cs_change: u8,        // __u8 cs_change
    tx_nbits: u8,         // __u8 tx_nbits
    rx_nbits: u8,         // __u8 rx_nbits
    word_delay_usecs: u8, // __u8 word_delay_usecs
    _pad: u8,             // padding
}

/// Full-duplex spidev channel
pub struct LinuxSpi {
    /// File handle for spidev device
    file: File,
    /// Current speed in Hz
    speed_hz: u32,
}

impl LinuxSpi {
    /// Open and configure a spidev device
    pub fn open(path: &str, speed_hz: u32) -> Result<Self> {
        log::debug!("it8951 spi: Opening device {}", path);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| LinuxHostError::OpenFailed {
                path: path.to_string(),
                source: e,
            })?;

        let fd = file.as_raw_fd();

        let mode = mode::MODE_0 | mode::NO_CS;
        unsafe {
            ioctl::spi_ioc_wr_mode(fd, &mode).map_err(|e| LinuxHostError::SetModeFailed {
                mode,
                source: std::io::Error::from_raw_os_error(e as i32),
            })?;
        }

        // MSB first
        let lsb_first: u8 = 0;
        unsafe {
            ioctl::spi_ioc_wr_lsb_first(fd, &lsb_first).map_err(|e| {
                LinuxHostError::SetBitOrderFailed(std::io::Error::from_raw_os_error(e as i32))
            })?;
        }

        let bits: u8 = 8;
        unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits).map_err(|e| {
                LinuxHostError::SetBitsPerWordFailed {
                    bits,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed_hz).map_err(|e| {
                LinuxHostError::SetSpeedFailed {
                    speed: speed_hz,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        log::debug!(
            "it8951 spi: {} configured (mode=0x{:02X}, speed={} kHz)",
            path,
            mode,
            speed_hz / 1000
        );

        Ok(Self { file, speed_hz })
    }

    /// Get current speed setting
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    /// Exchange one byte in each direction
    pub fn transfer_byte(&mut self, out: u8) -> Result<u8> {
        let tx = [out];
        let mut rx = [0u8; 1];

        let transfer = SpiIocTransfer {
            tx_buf: tx.as_ptr() as u64,
            rx_buf: rx.as_mut_ptr() as u64,
            len: 1,
            speed_hz: self.speed_hz,
            bits_per_word: 8,
            ..Default::default()
        };

        let ioctl_num = ioctl::spi_ioc_message(1);
        let ret = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                ioctl_num,
                &transfer as *const SpiIocTransfer,
            )
        };

        if ret < 0 {
            return Err(LinuxHostError::TransferFailed(
                std::io::Error::last_os_error(),
            ));
        }

        Ok(rx[0])
    }
}

/// Convert a BCM2835 clock divider into a speed in Hz
pub fn speed_from_divider(divider: u32) -> Option<u32> {
    if divider == 0 {
        return None;
    }
    Some(BCM2835_CORE_CLOCK_HZ / divider)
}
