//! The device registrar referenced by §3 as an external collaborator:
//! opens a backend, wraps it in a [`Device`], and makes it reachable by
//! name for the router. Teardown is only valid once a device's tracker
//! reports idle, per §5's cancellation contract.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use snafu::{OptionExt, ResultExt};

use crate::config::Config;
use crate::core::{self, CoreError};
use crate::device::{Backend, Device, Transport};

static DEVICES: Lazy<Mutex<HashMap<String, Arc<Device>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Opens `backend` and registers it under `name`, ready for
/// [`crate::router::route`] to dispatch commands against.
pub fn register(
    name: impl Into<String>,
    block_size: u32,
    backend: Arc<dyn Backend>,
    transport: Arc<dyn Transport>,
    config: &Config,
) -> Result<Arc<Device>, CoreError> {
    let name = name.into();
    backend.open().context(core::OpenDevice { name: name.clone() })?;

    let device = Arc::new(Device::new(
        name.clone(),
        block_size,
        backend,
        transport,
        config.workers_per_device,
        config.queue_depth,
    ));

    DEVICES.lock().insert(name, device.clone());
    Ok(device)
}

pub fn lookup(name: &str) -> Result<Arc<Device>, CoreError> {
    DEVICES
        .lock()
        .get(name)
        .cloned()
        .context(core::DeviceNotFound { name })
}

/// Removes and closes a device. Only valid once the device's tracker
/// reads zero; callers are expected to have quiesced the device first
/// (the transport guarantees no in-flight commands before teardown).
pub fn unregister(name: &str) -> Result<(), CoreError> {
    let device = DEVICES
        .lock()
        .remove(name)
        .context(core::DeviceNotFound { name })?;
    device.tracker.assert_idle();
    device.backend.close();
    Ok(())
}
