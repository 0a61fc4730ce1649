use anyhow::{Context, Result};
use console::style;
use cpal::traits::{DeviceTrait, HostTrait};

/// One device as shown by `voxrange devices`.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub is_default: bool,
    /// "2ch  44100-48000 Hz  F32" style lines, one per supported config.
    pub configs: Vec<String>,
}

/// Print input devices (for `[recording] device`) and output devices.
pub fn list_devices() -> Result<()> {
    let host = cpal::default_host();

    let default_in = host.default_input_device().and_then(|d| d.name().ok());
    let inputs = host
        .input_devices()
        .context("Failed to enumerate input devices")?
        .map(|d| {
            let configs = d
                .supported_input_configs()
                .map(|cs| cs.map(|c| describe_range(&c)).collect())
                .unwrap_or_else(|e| vec![format!("Could not query configs: {e}")]);
            describe(&d, default_in.as_deref(), configs)
        })
        .collect::<Vec<_>>();

    let default_out = host.default_output_device().and_then(|d| d.name().ok());
    let outputs = host
        .output_devices()
        .context("Failed to enumerate output devices")?
        .map(|d| {
            let configs = d
                .supported_output_configs()
                .map(|cs| cs.map(|c| describe_range(&c)).collect())
                .unwrap_or_else(|e| vec![format!("Could not query configs: {e}")]);
            describe(&d, default_out.as_deref(), configs)
        })
        .collect::<Vec<_>>();

    print_section("Audio Input Devices", &inputs);
    print_section("Audio Output Devices", &outputs);

    if inputs.iter().chain(outputs.iter()).any(|d| d.is_default) {
        println!("  {} = default device", style("*").green().bold());
    }

    Ok(())
}

fn describe(device: &cpal::Device, default_name: Option<&str>, configs: Vec<String>) -> DeviceInfo {
    let name = device.name().unwrap_or_else(|_| "<unknown>".into());
    DeviceInfo {
        is_default: default_name == Some(name.as_str()),
        name,
        configs,
    }
}

fn describe_range(cfg: &cpal::SupportedStreamConfigRange) -> String {
    format_config(
        cfg.channels(),
        cfg.min_sample_rate().0,
        cfg.max_sample_rate().0,
        &format!("{:?}", cfg.sample_format()),
    )
}

fn format_config(channels: u16, min_rate: u32, max_rate: u32, format: &str) -> String {
    if min_rate == max_rate {
        format!("{channels}ch  {min_rate} Hz  {format}")
    } else {
        format!("{channels}ch  {min_rate}-{max_rate} Hz  {format}")
    }
}

fn print_section(title: &str, devices: &[DeviceInfo]) {
    println!("{}", style(title).bold());
    println!();

    if devices.is_empty() {
        println!("    (none found)");
        println!();
        return;
    }

    for device in devices {
        if device.is_default {
            println!(
                "  {} {}",
                style("*").green().bold(),
                style(&device.name).green().bold()
            );
        } else {
            println!("    {}", style(&device.name).bold());
        }
        for line in &device.configs {
            println!("      {line}");
        }
        println!();
    }
}
