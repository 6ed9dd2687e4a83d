//! Sysfs-backed bus access
//!
//! Each slave appears as a directory under `/sys/bus/w1/devices` with a
//! `name` file (first line is the device id) and a `w1_slave` file carrying
//! the raw two-line record.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tendril_core::DeviceId;
use tracing::{debug, warn};

use crate::bus::{BusDevice, W1Bus};

/// Default sysfs mount point of the w1 bus
pub const DEFAULT_BASE_DIR: &str = "/sys/bus/w1/devices";

/// Per-device raw data file
const SLAVE_FILE: &str = "w1_slave";

/// 1-Wire bus rooted at a sysfs directory
pub struct SysfsBus {
    base_dir: PathBuf,
}

impl SysfsBus {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl Default for SysfsBus {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DIR)
    }
}

impl W1Bus for SysfsBus {
    fn enumerate(&self) -> Vec<BusDevice> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    dir = %self.base_dir.display(),
                    error = %e,
                    "Failed to scan bus directory"
                );
                return Vec::new();
            }
        };

        let mut name_files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path().join("name"))
            .filter(|path| path.is_file())
            .collect();
        name_files.sort();

        let mut devices = Vec::new();
        for name_file in name_files {
            match read_device_id(&name_file) {
                Some(id) => {
                    debug!(device = %id, "Found device");
                    devices.push(BusDevice {
                        id,
                        data_path: name_file.with_file_name(SLAVE_FILE),
                    });
                }
                None => {
                    // Dropped from this cycle's enumeration entirely
                    warn!(path = %name_file.display(), "Failed to resolve device id");
                }
            }
        }
        devices
    }

    fn read_raw(&self, device: &BusDevice) -> io::Result<Vec<String>> {
        let content = fs::read_to_string(&device.data_path)?;
        Ok(content.lines().map(str::to_string).collect())
    }
}

/// The device id is the first line of the `name` file
fn read_device_id(path: &Path) -> Option<DeviceId> {
    let content = fs::read_to_string(path).ok()?;
    let id = content.lines().next()?.trim();
    if id.is_empty() {
        return None;
    }
    Some(DeviceId::new(id))
}
