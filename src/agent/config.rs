//! Target application and timing settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings describing the target app and the decision timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Package of the application kept in the foreground.
    pub target_package: String,
    /// Main entry activity of the target application.
    pub main_activity: String,
    /// Activities known to host interstitial ads.
    pub ad_activities: Vec<String>,
    /// Package of the app store that some ads open.
    pub store_package: String,
    /// Seconds an ad surface is allowed to run before it is left.
    pub ad_timeout_secs: u64,
    /// Main-view cycles without a detection tolerated before a restart.
    pub max_idle_cycles: u32,
    /// Duration of the content-advancing swipe in milliseconds.
    pub swipe_duration_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            target_package: String::from("com.nimses"),
            main_activity: String::from(
                "com.nimses.navigation.presentation.view.screens.main.MainActivity",
            ),
            ad_activities: vec![
                String::from("com.adcolony.sdk.AdColonyInterstitialActivity"),
                String::from("com.unity3d.ads.adunit.AdUnitActivity"),
                String::from("com.unity3d.services.ads.adunit.AdUnitActivity"),
                String::from("com.ironsource.sdk.controller.ControllerActivity"),
            ],
            store_package: String::from("com.android.vending"),
            ad_timeout_secs: 35,
            max_idle_cycles: 10,
            swipe_duration_ms: 1_000,
        }
    }
}

impl AgentConfig {
    /// Returns the ad timeout.
    pub fn ad_timeout(&self) -> Duration {
        Duration::from_secs(self.ad_timeout_secs)
    }

    /// Returns the swipe duration.
    pub fn swipe_duration(&self) -> Duration {
        Duration::from_millis(self.swipe_duration_ms)
    }
}
