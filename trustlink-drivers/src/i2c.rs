//! embedded-hal I2C adapter

use embedded_hal::i2c::{Error as _, I2c, Operation};
use trustlink_hal::{BusFault, I2cMaster};

/// Blocking embedded-hal I2C bus as an [`I2cMaster`]
///
/// embedded-hal always ends a transaction with a stop condition, so a
/// transfer with `send_stop == false` is still closed on the wire. The
/// secure element protocol tolerates this since every frame is a
/// complete write or read.
pub struct EhI2c<I> {
    i2c: I,
}

impl<I: I2c> EhI2c<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Get the wrapped bus back
    pub fn release(self) -> I {
        self.i2c
    }

    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.i2c
    }
}

impl<I: I2c> I2cMaster for EhI2c<I> {
    type Error = BusFault;

    fn master_write(&mut self, address: u8, data: &[u8], _send_stop: bool) -> Result<(), BusFault> {
        self.i2c
            .transaction(address, &mut [Operation::Write(data)])
            .map_err(|e| e.kind().into())
    }

    fn master_read(
        &mut self,
        address: u8,
        buf: &mut [u8],
        _send_stop: bool,
    ) -> Result<(), BusFault> {
        self.i2c
            .transaction(address, &mut [Operation::Read(buf)])
            .map_err(|e| e.kind().into())
    }
}
