//! Host-side data store
//!
//! Fixed RAM slots where the command library parks data it needs back
//! later: the platform-binding shared secret, the shielded-connection
//! manage context and the application context saved across hibernate.

use heapless::Vec;

/// Maximum length of the platform-binding shared secret
pub const SHARED_SECRET_MAX_LEN: usize = 64;

/// Maximum length of the manage context
pub const MANAGE_CONTEXT_MAX_LEN: usize = 0x42;

/// Storage slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Slot {
    /// Platform-binding shared secret
    PlatformBindingSecret,
    /// Shielded-connection manage context
    ManageContext,
    /// Application context saved before hibernate
    HibernateContext,
}

impl Slot {
    /// Identifier used by the command library
    pub const fn id(self) -> u16 {
        match self {
            Slot::PlatformBindingSecret => 0x11,
            Slot::ManageContext => 0x12,
            Slot::HibernateContext => 0x13,
        }
    }
}

impl TryFrom<u16> for Slot {
    type Error = DataStoreError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        match id {
            0x11 => Ok(Slot::PlatformBindingSecret),
            0x12 => Ok(Slot::ManageContext),
            0x13 => Ok(Slot::HibernateContext),
            _ => Err(DataStoreError::UnknownSlot),
        }
    }
}

/// Data store error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataStoreError {
    /// No slot with this identifier
    UnknownSlot,
    /// Data does not fit the slot
    TooLarge,
    /// Caller's buffer is shorter than the stored data
    BufferTooSmall,
}

/// Factory shared secret: 0x01, 0x02, ..., 0x40
const DEFAULT_SHARED_SECRET: [u8; SHARED_SECRET_MAX_LEN] = {
    let mut secret = [0u8; SHARED_SECRET_MAX_LEN];
    let mut i = 0;
    while i < SHARED_SECRET_MAX_LEN {
        secret[i] = (i + 1) as u8;
        i += 1;
    }
    secret
};

/// RAM-backed store with one buffer per slot
///
/// `APP` is the capacity of the hibernate context slot.
pub struct DataStore<const APP: usize> {
    shared_secret: Vec<u8, SHARED_SECRET_MAX_LEN>,
    manage_context: Vec<u8, MANAGE_CONTEXT_MAX_LEN>,
    app_context: Vec<u8, APP>,
}

impl<const APP: usize> Default for DataStore<APP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const APP: usize> DataStore<APP> {
    /// Store holding the factory shared secret and empty contexts
    pub fn new() -> Self {
        let mut shared_secret = Vec::new();
        // Capacity equals the array length
        let _ = shared_secret.extend_from_slice(&DEFAULT_SHARED_SECRET);
        Self {
            shared_secret,
            manage_context: Vec::new(),
            app_context: Vec::new(),
        }
    }

    /// Replace the contents of `slot`
    pub fn write(&mut self, slot: Slot, data: &[u8]) -> Result<(), DataStoreError> {
        let result = match slot {
            Slot::PlatformBindingSecret => replace(&mut self.shared_secret, data),
            Slot::ManageContext => replace(&mut self.manage_context, data),
            Slot::HibernateContext => replace(&mut self.app_context, data),
        };
        if result.is_err() {
            warn!("datastore write of {} bytes to {} rejected", data.len(), slot);
        }
        result
    }

    /// Copy the contents of `slot` into `buf`, returning the length
    pub fn read(&self, slot: Slot, buf: &mut [u8]) -> Result<usize, DataStoreError> {
        let stored = self.get(slot);
        let out = buf
            .get_mut(..stored.len())
            .ok_or(DataStoreError::BufferTooSmall)?;
        out.copy_from_slice(stored);
        Ok(stored.len())
    }

    /// Contents of `slot`
    pub fn get(&self, slot: Slot) -> &[u8] {
        match slot {
            Slot::PlatformBindingSecret => self.shared_secret.as_slice(),
            Slot::ManageContext => self.manage_context.as_slice(),
            Slot::HibernateContext => self.app_context.as_slice(),
        }
    }

    /// [`write`](Self::write) addressed by raw identifier
    pub fn write_id(&mut self, id: u16, data: &[u8]) -> Result<(), DataStoreError> {
        self.write(Slot::try_from(id)?, data)
    }

    /// [`read`](Self::read) addressed by raw identifier
    pub fn read_id(&self, id: u16, buf: &mut [u8]) -> Result<usize, DataStoreError> {
        self.read(Slot::try_from(id)?, buf)
    }
}

fn replace<const N: usize>(slot: &mut Vec<u8, N>, data: &[u8]) -> Result<(), DataStoreError> {
    if data.len() > N {
        return Err(DataStoreError::TooLarge);
    }
    slot.clear();
    slot.extend_from_slice(data)
        .map_err(|_| DataStoreError::TooLarge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_secret() {
        let store = DataStore::<32>::new();
        let mut buf = [0u8; 64];

        assert_eq!(store.read(Slot::PlatformBindingSecret, &mut buf), Ok(64));
        assert_eq!(buf[0], 0x01);
        assert_eq!(buf[63], 0x40);
    }

    #[test]
    fn test_write_then_read() {
        let mut store = DataStore::<32>::new();
        let mut buf = [0u8; 8];

        store.write(Slot::HibernateContext, &[9, 8, 7]).unwrap();
        assert_eq!(store.read(Slot::HibernateContext, &mut buf), Ok(3));
        assert_eq!(&buf[..3], &[9, 8, 7]);
    }

    #[test]
    fn test_every_slot_is_bounded() {
        let mut store = DataStore::<16>::new();
        let big = [0u8; 67];

        assert_eq!(
            store.write(Slot::PlatformBindingSecret, &big[..65]),
            Err(DataStoreError::TooLarge)
        );
        assert_eq!(store.write(Slot::ManageContext, &big), Err(DataStoreError::TooLarge));
        assert_eq!(
            store.write(Slot::HibernateContext, &big[..17]),
            Err(DataStoreError::TooLarge)
        );
        // Rejected writes keep the old contents
        assert_eq!(store.get(Slot::PlatformBindingSecret).len(), 64);
    }

    #[test]
    fn test_short_read_buffer() {
        let store = DataStore::<16>::new();
        let mut buf = [0u8; 10];
        assert_eq!(
            store.read(Slot::PlatformBindingSecret, &mut buf),
            Err(DataStoreError::BufferTooSmall)
        );
    }

    #[test]
    fn test_raw_identifiers() {
        let mut store = DataStore::<16>::new();
        let mut buf = [0u8; 4];

        store.write_id(0x12, &[1, 2]).unwrap();
        assert_eq!(store.read_id(0x12, &mut buf), Ok(2));
        assert_eq!(store.write_id(0x99, &[1]), Err(DataStoreError::UnknownSlot));
        assert_eq!(Slot::try_from(0x13), Ok(Slot::HibernateContext));
        assert_eq!(Slot::ManageContext.id(), 0x12);
    }
}
