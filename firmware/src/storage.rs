//! Configuration persistence in the last flash sector.

use defmt::{info, warn};
use embassy_rp::flash::{Blocking, Error as FlashError, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use remap_core::image::MAX_IMAGE_LEN;
use remap_core::Config;

/// Pico board flash size.
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Offset of the configuration sector from the start of flash.
pub const CONFIG_OFFSET: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;

pub type ConfigFlash<'d> = Flash<'d, FLASH, Blocking, FLASH_SIZE>;

/// Read the stored configuration.
///
/// An unreadable or invalid image yields the defaults, which are then
/// written back so the sector holds a valid image from now on.
pub fn load_config(flash: &mut ConfigFlash<'_>) -> Config {
    let mut buf = [0u8; MAX_IMAGE_LEN];
    if let Err(e) = flash.blocking_read(CONFIG_OFFSET, &mut buf) {
        warn!("Config read failed: {:?}", e);
        return Config::default();
    }

    let (config, stored) = Config::load_or_default(&buf);
    if !stored {
        info!("Writing default config to flash");
        if let Err(e) = save_config(flash, &config) {
            warn!("Config write failed: {:?}", e);
        }
    }
    config
}

/// Erase the configuration sector and program `config` into it.
pub fn save_config(flash: &mut ConfigFlash<'_>, config: &Config) -> Result<(), FlashError> {
    let mut buf = [0u8; MAX_IMAGE_LEN];
    let len = config.encode_image(&mut buf);

    flash.blocking_erase(CONFIG_OFFSET, CONFIG_OFFSET + ERASE_SIZE as u32)?;
    flash.blocking_write(CONFIG_OFFSET, &buf[..len])?;
    info!("Config saved ({} bytes)", len);
    Ok(())
}
