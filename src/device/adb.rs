//! [`DeviceActuator`] implemented with `shell:` service requests.

use super::actuator::{ActuationError, DeviceActuator, ForegroundApp};
use crate::transport::TransportChannel;
use std::time::Duration;

/// A device controlled through the ADB server.
#[derive(Debug, Clone)]
pub struct AdbDevice {
    channel: TransportChannel,
}

impl AdbDevice {
    /// Creates a device driven through `channel`.
    pub fn new(channel: TransportChannel) -> Self {
        Self { channel }
    }

    /// Returns the device serial.
    pub fn serial(&self) -> &str {
        self.channel.serial()
    }

    /// Runs a shell command and returns its combined output.
    pub fn shell(&self, command: &str) -> Result<String, ActuationError> {
        let output = self.channel.request(&format!("shell:{command}"))?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    fn shell_checked(&self, command: &str) -> Result<String, ActuationError> {
        let output = self.shell(command)?;
        if output.lines().any(|line| line.trim_start().starts_with("Error")) {
            return Err(ActuationError::UnexpectedOutput {
                command: command.to_string(),
                output: output.trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl DeviceActuator for AdbDevice {
    fn tap(&self, x: u32, y: u32) -> Result<(), ActuationError> {
        self.shell_checked(&format!("input tap {x} {y}"))?;
        Ok(())
    }

    fn swipe(
        &self,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        duration: Duration,
    ) -> Result<(), ActuationError> {
        self.shell_checked(&format!(
            "input swipe {x1} {y1} {x2} {y2} {}",
            duration.as_millis()
        ))?;
        Ok(())
    }

    fn app_start(&self, package: &str, activity: &str) -> Result<(), ActuationError> {
        self.shell_checked(&format!("am start -n {package}/{activity}"))?;
        Ok(())
    }

    fn force_stop(&self, package: &str) -> Result<(), ActuationError> {
        let output = self.shell_checked(&format!("am force-stop {package}"))?;
        tracing::debug!(package, output = output.trim(), "Force-stopped package");
        Ok(())
    }

    fn current_app(&self) -> Result<ForegroundApp, ActuationError> {
        let command = "dumpsys window windows";
        let output = self.shell(command)?;
        parse_focused_app(&output).ok_or_else(|| ActuationError::UnexpectedOutput {
            command: command.to_string(),
            output: String::from("no focused application"),
        })
    }

    fn window_size(&self) -> Result<(u32, u32), ActuationError> {
        let command = "wm size";
        let output = self.shell(command)?;
        parse_window_size(&output).ok_or_else(|| ActuationError::UnexpectedOutput {
            command: command.to_string(),
            output: output.trim().to_string(),
        })
    }
}

/// Extracts the focused `package/activity` from `dumpsys window` output.
///
/// `mCurrentFocus` is preferred; `mFocusedApp` is used when the focused
/// window is not an activity (e.g. the status bar).
pub fn parse_focused_app(output: &str) -> Option<ForegroundApp> {
    ["mCurrentFocus=", "mFocusedApp="].iter().find_map(|key| {
        output
            .lines()
            .filter(|line| line.contains(key))
            .find_map(component_from_line)
    })
}

fn component_from_line(line: &str) -> Option<ForegroundApp> {
    let component = line
        .split_whitespace()
        .find(|token| token.contains('/') && !token.contains('='))?
        .trim_end_matches('}');
    let (package, activity) = component.split_once('/')?;
    if package.is_empty() || activity.is_empty() {
        return None;
    }

    let activity = match activity.strip_prefix('.') {
        Some(short) => format!("{package}.{short}"),
        None => activity.to_string(),
    };
    Some(ForegroundApp::new(package, activity))
}

/// Parses `wm size` output, preferring an override size over the physical one.
pub fn parse_window_size(output: &str) -> Option<(u32, u32)> {
    let find = |prefix: &str| {
        output.lines().find_map(|line| {
            let (w, h) = line.trim().strip_prefix(prefix)?.trim().split_once('x')?;
            Some((w.trim().parse::<u32>().ok()?, h.trim().parse::<u32>().ok()?))
        })
    };
    find("Override size:").or_else(|| find("Physical size:"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{fake_server, Reply};

    #[test]
    fn test_parse_current_focus() {
        let output = "  mCurrentFocus=Window{4f1e0a6 u0 com.nimses/com.nimses.navigation.presentation.view.screens.main.MainActivity}\n";
        assert_eq!(
            parse_focused_app(output),
            Some(ForegroundApp::new(
                "com.nimses",
                "com.nimses.navigation.presentation.view.screens.main.MainActivity"
            ))
        );
    }

    #[test]
    fn test_parse_short_activity_name() {
        let output = "mCurrentFocus=Window{1 u0 com.android.vending/.AssetBrowserActivity}";
        assert_eq!(
            parse_focused_app(output),
            Some(ForegroundApp::new(
                "com.android.vending",
                "com.android.vending.AssetBrowserActivity"
            ))
        );
    }

    #[test]
    fn test_falls_back_to_focused_app() {
        let output = "\
  mCurrentFocus=Window{9a1 u0 StatusBar}
  mFocusedApp=AppWindowToken{55 token=Token{66 ActivityRecord{77 u0 com.unity3d.ads/com.unity3d.ads.adunit.AdUnitActivity t12}}}";
        assert_eq!(
            parse_focused_app(output),
            Some(ForegroundApp::new(
                "com.unity3d.ads",
                "com.unity3d.ads.adunit.AdUnitActivity"
            ))
        );
    }

    #[test]
    fn test_no_focus_is_none() {
        assert_eq!(parse_focused_app("mCurrentFocus=null"), None);
    }

    #[test]
    fn test_parse_window_size() {
        assert_eq!(parse_window_size("Physical size: 1080x2340\n"), Some((1080, 2340)));
        assert_eq!(
            parse_window_size("Physical size: 1080x2340\nOverride size: 720x1560\n"),
            Some((720, 1560))
        );
        assert_eq!(parse_window_size("garbage"), None);
    }

    #[test]
    fn test_tap_sends_input_command() {
        let (config, server) = fake_server(Reply::Okay(Vec::new()));
        let device = AdbDevice::new(TransportChannel::new(config, "emulator-5554"));

        device.tap(100, 200).unwrap();
        assert_eq!(server.join().unwrap()[1], "shell:input tap 100 200");
    }

    #[test]
    fn test_swipe_duration_in_millis() {
        let (config, server) = fake_server(Reply::Okay(Vec::new()));
        let device = AdbDevice::new(TransportChannel::new(config, "emulator-5554"));

        device
            .swipe(540, 1755, 540, 585, Duration::from_secs(1))
            .unwrap();
        assert_eq!(
            server.join().unwrap()[1],
            "shell:input swipe 540 1755 540 585 1000"
        );
    }

    #[test]
    fn test_app_start_error_output_rejected() {
        let (config, server) = fake_server(Reply::Okay(
            b"Starting: Intent { cmp=com.x/.Main }\nError: Activity class {com.x/com.x.Main} does not exist.\n"
                .to_vec(),
        ));
        let device = AdbDevice::new(TransportChannel::new(config, "emulator-5554"));

        assert!(matches!(
            device.app_start("com.x", "com.x.Main"),
            Err(ActuationError::UnexpectedOutput { .. })
        ));
        assert_eq!(server.join().unwrap()[1], "shell:am start -n com.x/com.x.Main");
    }
}
