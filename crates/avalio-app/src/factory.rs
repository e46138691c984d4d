//! Config sections to trait objects.

use std::sync::Arc;

use avalio_core::config::{MonitorsConfig, NotificatorsConfig, ResourcesConfig};
use avalio_health::{HttpResource, PingResource, ProbeLock, Prober, Resource};
use avalio_notify::{ConsoleNotificator, Notificator, TelegramNotificator};
use avalio_schedule::Schedule;

use crate::application::Monitor;
use crate::error::{AppError, AppResult};

/// HTTP resources first, then ping, each in declaration order. Every ping
/// resource shares `prober` and `lock`.
pub fn build_resources(
    config: &ResourcesConfig,
    prober: Arc<dyn Prober>,
    lock: ProbeLock,
) -> AppResult<Vec<Arc<dyn Resource>>> {
    let mut resources: Vec<Arc<dyn Resource>> =
        Vec::with_capacity(config.http.len() + config.ping.len());

    for http in &config.http {
        resources.push(Arc::new(HttpResource::from_config(http)?));
    }
    for ping in &config.ping {
        resources.push(Arc::new(PingResource::from_config(
            ping,
            prober.clone(),
            lock.clone(),
        )?));
    }
    Ok(resources)
}

pub fn build_notificators(config: &NotificatorsConfig) -> AppResult<Vec<Arc<dyn Notificator>>> {
    let mut notificators: Vec<Arc<dyn Notificator>> =
        Vec::with_capacity(config.console.len() + config.telegram.len());

    for console in &config.console {
        notificators.push(Arc::new(ConsoleNotificator::new(&console.name)));
    }
    for telegram in &config.telegram {
        notificators.push(Arc::new(TelegramNotificator::from_config(telegram)?));
    }
    Ok(notificators)
}

/// Parse each monitor's cron expression. References stay unresolved.
pub fn build_monitors(config: &MonitorsConfig) -> AppResult<Vec<Monitor>> {
    config
        .cron
        .iter()
        .map(|m| {
            let schedule = Schedule::parse(&m.cron).map_err(|source| AppError::Schedule {
                monitor: m.name.clone(),
                source,
            })?;
            Ok(Monitor::new(
                &m.name,
                schedule,
                &m.resources,
                &m.notificators,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use avalio_core::AvalioConfig;
    use avalio_health::ProbeError;

    struct NoReply;

    #[async_trait]
    impl Prober for NoReply {
        async fn probe(&self, _address: &str, timeout: Duration) -> Result<Duration, ProbeError> {
            Err(ProbeError::Timeout(timeout))
        }
    }

    fn config(toml: &str) -> AvalioConfig {
        AvalioConfig::from_toml_str(toml).unwrap()
    }

    #[test]
    fn resources_in_declaration_order() {
        let config = config(
            r#"
[[resources.ping]]
name = "gateway"
address = "10.0.0.1"

[[resources.http]]
name = "site"
url = "https://example.com"

[[resources.http]]
name = "api"
url = "https://api.example.com/health"
expected_status = 204
"#,
        );
        let resources =
            build_resources(&config.resources, Arc::new(NoReply), ProbeLock::new()).unwrap();

        let names: Vec<_> = resources.iter().map(|r| (r.name(), r.kind())).collect();
        assert_eq!(
            names,
            vec![("site", "http"), ("api", "http"), ("gateway", "ping")]
        );
    }

    #[test]
    fn invalid_url_is_rejected() {
        let config = config(
            r#"
[[resources.http]]
name = "site"
url = "not a url"
"#,
        );
        let err = build_resources(&config.resources, Arc::new(NoReply), ProbeLock::new())
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Resource(_)));
    }

    #[test]
    fn notificators_of_both_kinds() {
        let config = config(
            r#"
[[notificators.console]]
name = "console"

[[notificators.telegram]]
name = "bot"
chat_id = "1"
token = "t"
"#,
        );
        let notificators = build_notificators(&config.notificators).unwrap();
        let kinds: Vec<_> = notificators.iter().map(|n| (n.name(), n.kind())).collect();
        assert_eq!(kinds, vec![("console", "console"), ("bot", "telegram")]);
    }

    #[test]
    fn monitors_keep_references() {
        let config = config(
            r#"
[[monitors.cron]]
name = "nightly"
cron = "@daily"
resources = ["a", "b"]
notificators = ["console"]
"#,
        );
        let monitors = build_monitors(&config.monitors).unwrap();
        assert_eq!(monitors.len(), 1);
        assert_eq!(monitors[0].name, "nightly");
        assert_eq!(monitors[0].resources, vec!["a", "b"]);
        assert_eq!(monitors[0].notificators, vec!["console"]);
    }

    #[test]
    fn invalid_cron_is_rejected() {
        let config = config(
            r#"
[[monitors.cron]]
name = "broken"
cron = "* * *"
"#,
        );
        let err = build_monitors(&config.monitors).unwrap_err();
        assert!(matches!(err, AppError::Schedule { ref monitor, .. } if monitor == "broken"));
    }
}
