//! Flash persistence for the user config block.
//!
//! A thin `sequential-storage` map with a single key. The central run loop
//! writes the config back whenever the sync scheduler reports it changed, so
//! wear leveling and power-loss recovery are entirely the map's concern. A
//! stored config whose version byte does not match this build is treated as
//! absent rather than an error.

use core::ops::Range;

use embassy_embedded_hal::adapter::BlockingAsync;
use embedded_storage::nor_flash::NorFlash;
use embedded_storage_async::nor_flash::NorFlash as AsyncNorFlash;
use sequential_storage::Error as SSError;
use sequential_storage::cache::NoCache;
use sequential_storage::map::{SerializationError, Value, fetch_item, store_item};
use seam_types::config::{CONFIG_WIRE_SIZE, UserConfig};
use seam_types::wire::WireBlock;

#[repr(u32)]
enum StorageKeys {
    UserConfig = 0,
}

/// Where in flash the storage area lives.
#[derive(Debug, Clone, Copy)]
pub struct StorageConfig {
    /// Start address of the area. `0` means the last `num_sectors` sectors
    /// of the flash.
    pub start_addr: usize,
    /// Number of erase sectors reserved. Must be at least 2 so the map can
    /// garbage-collect.
    pub num_sectors: u8,
    /// Erase the whole area on startup, discarding any saved config.
    pub clear_storage: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            start_addr: 0,
            num_sectors: 2,
            clear_storage: false,
        }
    }
}

/// Storage failures, flattened from the map's error so callers log one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    Flash,
    Full,
    Corrupted,
    Serialization,
}

impl<E> From<SSError<E>> for StorageError {
    fn from(e: SSError<E>) -> Self {
        match e {
            SSError::Storage { .. } => StorageError::Flash,
            SSError::FullStorage => StorageError::Full,
            SSError::Corrupted {} => StorageError::Corrupted,
            _ => StorageError::Serialization,
        }
    }
}

/// Wire-encoded [`UserConfig`] as a map value. Deserialization rejects a
/// version-skewed record so `load_config` can fall back to defaults.
struct ConfigRecord(UserConfig);

impl Value<'_> for ConfigRecord {
    fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        if buffer.len() < CONFIG_WIRE_SIZE {
            return Err(SerializationError::BufferTooSmall);
        }
        self.0.encode(&mut buffer[..CONFIG_WIRE_SIZE]);
        Ok(CONFIG_WIRE_SIZE)
    }

    fn deserialize_from(buffer: &[u8]) -> Result<Self, SerializationError>
    where
        Self: Sized,
    {
        if buffer.len() < CONFIG_WIRE_SIZE {
            return Err(SerializationError::InvalidFormat);
        }
        if !UserConfig::version_matches(buffer) {
            return Err(SerializationError::InvalidData);
        }
        Ok(Self(UserConfig::decode(buffer)))
    }
}

/// The persistence layer. Owns the flash and the reserved address range.
pub struct Storage<F: AsyncNorFlash> {
    flash: F,
    storage_range: Range<u32>,
    buffer: [u8; 128],
}

impl<F: AsyncNorFlash> Storage<F> {
    pub async fn new(flash: F, config: StorageConfig) -> Self {
        assert!(
            config.num_sectors >= 2,
            "Number of used sectors for storage must be larger than 1"
        );

        // start_addr == 0 places the area in the last num_sectors sectors.
        let storage_range = if config.start_addr == 0 {
            (flash.capacity() - config.num_sectors as usize * F::ERASE_SIZE) as u32
                ..flash.capacity() as u32
        } else {
            assert!(
                config.start_addr % F::ERASE_SIZE == 0,
                "Storage's start addr MUST BE a multiple of the sector size"
            );
            config.start_addr as u32
                ..(config.start_addr + config.num_sectors as usize * F::ERASE_SIZE) as u32
        };

        let mut storage = Self {
            flash,
            storage_range,
            buffer: [0; 128],
        };
        if config.clear_storage {
            if let Err(e) = storage.erase().await {
                error!("storage clear failed: {:?}", e);
            }
        }
        storage
    }

    /// Fetch the saved config. `Ok(None)` when nothing usable is stored,
    /// including a record from a different config version.
    pub async fn load_config(&mut self) -> Result<Option<UserConfig>, StorageError> {
        let fetched = fetch_item::<u32, ConfigRecord, _>(
            &mut self.flash,
            self.storage_range.clone(),
            &mut NoCache::new(),
            &mut self.buffer,
            &(StorageKeys::UserConfig as u32),
        )
        .await;
        match fetched {
            Ok(record) => Ok(record.map(|r| r.0)),
            Err(SSError::SerializationError(_)) => {
                warn!("saved config has a different version, using defaults");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the config, replacing any previous record.
    pub async fn save_config(&mut self, config: &UserConfig) -> Result<(), StorageError> {
        store_item::<u32, ConfigRecord, _>(
            &mut self.flash,
            self.storage_range.clone(),
            &mut NoCache::new(),
            &mut self.buffer,
            &(StorageKeys::UserConfig as u32),
            &ConfigRecord(*config),
        )
        .await?;
        Ok(())
    }

    /// Wipe the whole storage area.
    pub async fn erase(&mut self) -> Result<(), StorageError> {
        sequential_storage::erase_all(&mut self.flash, self.storage_range.clone()).await?;
        Ok(())
    }
}

/// Adapt a blocking flash driver to the async interface `Storage` expects.
pub fn async_flash_wrapper<F: NorFlash>(flash: F) -> BlockingAsync<F> {
    BlockingAsync::new(flash)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use embassy_futures::block_on;
    use embedded_storage_async::nor_flash::{
        ErrorType, NorFlash as AsyncNorFlashTrait, NorFlashError, NorFlashErrorKind,
        ReadNorFlash as AsyncReadNorFlash,
    };
    use seam_types::config::CONFIG_VERSION;
    use seam_types::wire::encode_to_array;

    use super::*;

    const FLASH_SIZE: usize = 1024;
    const ERASE_SIZE: usize = 256;

    #[derive(Debug)]
    struct MemFlashError;

    impl NorFlashError for MemFlashError {
        fn kind(&self) -> NorFlashErrorKind {
            NorFlashErrorKind::Other
        }
    }

    /// In-memory flash with real erase/write alignment rules.
    struct MemFlash {
        data: [u8; FLASH_SIZE],
    }

    impl MemFlash {
        fn new() -> Self {
            Self {
                data: [0xFF; FLASH_SIZE],
            }
        }
    }

    impl ErrorType for MemFlash {
        type Error = MemFlashError;
    }

    impl AsyncReadNorFlash for MemFlash {
        const READ_SIZE: usize = 1;

        async fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            let offset = offset as usize;
            if offset + bytes.len() > FLASH_SIZE {
                return Err(MemFlashError);
            }
            bytes.copy_from_slice(&self.data[offset..offset + bytes.len()]);
            Ok(())
        }

        fn capacity(&self) -> usize {
            FLASH_SIZE
        }
    }

    impl AsyncNorFlashTrait for MemFlash {
        const WRITE_SIZE: usize = 4;
        const ERASE_SIZE: usize = ERASE_SIZE;

        async fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
            let (from, to) = (from as usize, to as usize);
            if from % ERASE_SIZE != 0 || to % ERASE_SIZE != 0 || to > FLASH_SIZE {
                return Err(MemFlashError);
            }
            self.data[from..to].fill(0xFF);
            Ok(())
        }

        async fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            let offset = offset as usize;
            if offset % Self::WRITE_SIZE != 0
                || bytes.len() % Self::WRITE_SIZE != 0
                || offset + bytes.len() > FLASH_SIZE
            {
                return Err(MemFlashError);
            }
            for (dst, src) in self.data[offset..].iter_mut().zip(bytes) {
                *dst &= *src;
            }
            Ok(())
        }
    }

    fn storage() -> Storage<MemFlash> {
        block_on(Storage::new(MemFlash::new(), StorageConfig::default()))
    }

    #[test]
    fn blank_flash_loads_nothing() {
        let mut storage = storage();
        assert_eq!(block_on(storage.load_config()), Ok(None));
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut storage = storage();
        let mut config = UserConfig::default();
        config.oled_brightness = 7;
        config.rtc.utc_offset_quarters = -20;

        block_on(storage.save_config(&config)).unwrap();
        assert_eq!(block_on(storage.load_config()), Ok(Some(config)));
    }

    #[test]
    fn later_save_wins() {
        let mut storage = storage();
        let mut config = UserConfig::default();
        block_on(storage.save_config(&config)).unwrap();

        config.rgb.mode = 9;
        block_on(storage.save_config(&config)).unwrap();
        assert_eq!(block_on(storage.load_config()), Ok(Some(config)));
    }

    #[test]
    fn erase_discards_saved_config() {
        let mut storage = storage();
        block_on(storage.save_config(&UserConfig::default())).unwrap();
        block_on(storage.erase()).unwrap();
        assert_eq!(block_on(storage.load_config()), Ok(None));
    }

    #[test]
    fn clear_storage_flag_starts_blank() {
        let mut flash = MemFlash::new();
        // Pre-populate, then reopen with clear_storage.
        let mut storage = block_on(Storage::new(flash, StorageConfig::default()));
        block_on(storage.save_config(&UserConfig::default())).unwrap();
        flash = storage.flash;

        let mut storage = block_on(Storage::new(
            flash,
            StorageConfig {
                clear_storage: true,
                ..StorageConfig::default()
            },
        ));
        assert_eq!(block_on(storage.load_config()), Ok(None));
    }

    #[test]
    fn version_skewed_record_is_rejected() {
        let mut buf: [u8; CONFIG_WIRE_SIZE] = encode_to_array(&UserConfig::default());
        buf[0] = CONFIG_VERSION.wrapping_add(1);
        assert!(ConfigRecord::deserialize_from(&buf).is_err());
        assert!(ConfigRecord::deserialize_from(&buf[..10]).is_err());
    }
}
