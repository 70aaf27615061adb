//! Read boot reports from a running adapter.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use c64key_core::report::REPORT_LEN;
use c64key_core::{KeyCode, Modifier, Report, USB_PID, USB_VID};
use indicatif::{ProgressBar, ProgressStyle};
use rusb::{DeviceHandle, GlobalContext};

/// Keyboard IN endpoint.
const REPORT_ENDPOINT: u8 = 0x81;
const INTERFACE: u8 = 0;

/// How long one interrupt read may block.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// How long to wait for the adapter to show up.
const FIND_ATTEMPTS: u32 = 100;
const FIND_INTERVAL: Duration = Duration::from_millis(100);

/// Whether an adapter is plugged in.
fn detect() -> Result<bool> {
    let devices = rusb::devices().context("failed to enumerate USB devices")?;
    for device in devices.iter() {
        let desc = device
            .device_descriptor()
            .context("failed to read device descriptor")?;
        if desc.vendor_id() == USB_VID && desc.product_id() == USB_PID {
            return Ok(true);
        }
    }
    Ok(false)
}

fn wait_for_adapter() -> Result<()> {
    if detect()? {
        return Ok(());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .context("spinner template")?,
    );
    pb.set_message(format!(
        "waiting for adapter {:04x}:{:04x}",
        USB_VID, USB_PID
    ));

    for _ in 0..FIND_ATTEMPTS {
        pb.tick();
        std::thread::sleep(FIND_INTERVAL);
        if detect()? {
            pb.finish_with_message("adapter found");
            return Ok(());
        }
    }
    pb.abandon_with_message("adapter not found");
    bail!("no adapter with ID {:04x}:{:04x} connected", USB_VID, USB_PID);
}

fn open_device() -> Result<DeviceHandle<GlobalContext>> {
    let handle = rusb::open_device_with_vid_pid(USB_VID, USB_PID).context(
        "failed to open adapter (may need root/sudo or udev rules)",
    )?;

    // The host's keyboard driver owns the interface; borrow it for the session.
    if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
        tracing::debug!("auto-detach not supported: {e}");
    }
    handle
        .claim_interface(INTERFACE)
        .context("failed to claim keyboard interface")?;
    Ok(handle)
}

/// One decoded report as a line of text.
pub fn describe(report: &Report) -> String {
    let mut parts: Vec<&str> = Modifier::ALL
        .into_iter()
        .filter(|m| report.modifiers & m.bit() != 0)
        .map(Modifier::display_name)
        .collect();

    if report.is_rollover() {
        parts.push("<rollover>");
    } else {
        for usage in report.pressed() {
            match KeyCode::try_from(usage) {
                Ok(code) => parts.push(code.display_name()),
                Err(_) => parts.push("<unknown>"),
            }
        }
    }

    let bytes = report
        .to_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");

    if parts.is_empty() {
        format!("{bytes}  (released)")
    } else {
        format!("{bytes}  {}", parts.join(" + "))
    }
}

/// Print reports until `count` have arrived, or forever.
pub fn watch(count: Option<usize>) -> Result<()> {
    wait_for_adapter()?;
    let handle = open_device()?;
    println!("Watching reports, press keys on the Commodore keyboard.");

    let mut seen = 0usize;
    let mut buf = [0u8; REPORT_LEN];
    while count.map_or(true, |n| seen < n) {
        match handle.read_interrupt(REPORT_ENDPOINT, &mut buf, READ_TIMEOUT) {
            Ok(REPORT_LEN) => {
                let report = Report::from_bytes(&buf);
                println!("{}", describe(&report));
                seen += 1;
            }
            Ok(n) => tracing::warn!("short report: {n} bytes"),
            Err(rusb::Error::Timeout) => continue,
            Err(e) => return Err(e).context("reading keyboard endpoint"),
        }
    }

    let _ = handle.release_interface(INTERFACE);
    Ok(())
}
