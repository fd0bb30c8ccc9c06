use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("spi error: {0}")]
    Spi(String),
    #[error("adc short transfer: got {0} of 3 bytes")]
    ShortTransfer(usize),
    #[error("adc channel {0} out of range")]
    Channel(u8),
    #[error("simulated sensor fault")]
    Simulated,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
