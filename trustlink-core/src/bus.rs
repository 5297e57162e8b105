//! Bus driver
//!
//! Byte-level transactions to the one peer address the transport talks
//! to. Framing (start, repeated start, stop) is left to the
//! [`I2cMaster`] implementation; this layer only decides the address and
//! whether a stop condition follows.

use trustlink_hal::{BusFault, I2cConfig, I2cMaster};

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Read,
    Write,
}

/// Data carried by a transaction
pub enum Payload<'a> {
    /// Bytes to send
    Write(&'a [u8]),
    /// Buffer to fill
    Read(&'a mut [u8]),
}

/// One bus transfer, built per call and dropped on return
pub struct Transaction<'a> {
    /// 7-bit peer address
    pub address: u8,
    /// Generate a stop condition at the end
    pub send_stop: bool,
    /// Direction and buffer
    pub payload: Payload<'a>,
}

impl Transaction<'_> {
    /// Direction of the transfer
    pub fn direction(&self) -> Direction {
        match self.payload {
            Payload::Write(_) => Direction::Write,
            Payload::Read(_) => Direction::Read,
        }
    }

    /// Number of bytes moved
    pub fn len(&self) -> usize {
        match &self.payload {
            Payload::Write(data) => data.len(),
            Payload::Read(buf) => buf.len(),
        }
    }

    /// True for zero-length transfers
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bus driver bound to a fixed peer address
pub struct BusDriver<B> {
    bus: B,
    address: u8,
    send_stop: bool,
}

impl<B: I2cMaster> BusDriver<B> {
    /// Create a driver for the peer at `address`
    pub fn new(bus: B, address: u8, send_stop: bool) -> Self {
        Self {
            bus,
            address,
            send_stop,
        }
    }

    /// Peer address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// (Re-)configure the peripheral
    pub fn configure(&mut self, config: &I2cConfig) -> Result<(), BusFault> {
        self.bus.configure(config).map_err(Into::into)
    }

    /// Write `data` to the peer
    pub fn write(&mut self, data: &[u8]) -> Result<(), BusFault> {
        self.execute(Transaction {
            address: self.address,
            send_stop: self.send_stop,
            payload: Payload::Write(data),
        })
    }

    /// Fill `buf` from the peer
    pub fn read(&mut self, buf: &mut [u8]) -> Result<(), BusFault> {
        self.execute(Transaction {
            address: self.address,
            send_stop: self.send_stop,
            payload: Payload::Read(buf),
        })
    }

    /// Run a single transaction
    pub fn execute(&mut self, txn: Transaction<'_>) -> Result<(), BusFault> {
        trace!(
            "i2c {} addr={=u8:#x} len={} stop={}",
            txn.direction(),
            txn.address,
            txn.len(),
            txn.send_stop
        );

        let result = match txn.payload {
            Payload::Write(data) => self.bus.master_write(txn.address, data, txn.send_stop),
            Payload::Read(buf) => self.bus.master_read(txn.address, buf, txn.send_stop),
        };
        result.map_err(Into::into)
    }

    /// Borrow the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutably borrow the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }
}
