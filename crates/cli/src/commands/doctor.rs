use brandlens_agent::diagnostics::{self, CredentialStatus};
use brandlens_agent::OpenAiClient;
use brandlens_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    analysis_mode: &'static str,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool, probe: bool) -> CommandResult {
    let report = build_report(probe);
    let exit_code = if report.overall_status == CheckStatus::Fail { 1 } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(probe: bool) -> DoctorReport {
    let mut checks = Vec::new();
    let mut analysis_mode = "unknown";

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_upload_dir(&config));

            let credential = diagnostics::check_credential(config.llm.api_key.as_ref());
            analysis_mode =
                if config.llm.is_configured() { "model" } else { "fallback_only" };
            checks.push(check_credential_format(credential));
            checks.extend(check_service(&config, credential, probe));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["upload_storage", "analysis_credential", MODEL_PROBE, COMPLETION_PROBE] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_fail = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_fail { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_fail {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, analysis_mode, summary, checks }
}

fn check_upload_dir(config: &AppConfig) -> DoctorCheck {
    let upload_dir = &config.server.upload_dir;
    match std::fs::create_dir_all(upload_dir) {
        Ok(()) => DoctorCheck {
            name: "upload_storage",
            status: CheckStatus::Pass,
            details: format!("upload directory `{}` is available", upload_dir.display()),
        },
        Err(error) => DoctorCheck {
            name: "upload_storage",
            status: CheckStatus::Fail,
            details: format!("upload directory `{}` unavailable: {error}", upload_dir.display()),
        },
    }
}

fn check_credential_format(credential: CredentialStatus) -> DoctorCheck {
    let status = match credential {
        CredentialStatus::InvalidFormat => CheckStatus::Fail,
        CredentialStatus::Missing | CredentialStatus::WellFormed => CheckStatus::Pass,
    };
    DoctorCheck { name: "analysis_credential", status, details: credential.detail().to_string() }
}

const MODEL_PROBE: &str = "analysis_service_probe";
const COMPLETION_PROBE: &str = "analysis_completion_probe";

/// Model listing first, then a minimal chat completion with the same client.
fn check_service(
    config: &AppConfig,
    credential: CredentialStatus,
    probe: bool,
) -> [DoctorCheck; 2] {
    let skip_both = |details: &str| {
        [MODEL_PROBE, COMPLETION_PROBE].map(|name| DoctorCheck {
            name,
            status: CheckStatus::Skipped,
            details: details.to_string(),
        })
    };
    let fail_both = |details: String| {
        [MODEL_PROBE, COMPLETION_PROBE].map(|name| DoctorCheck {
            name,
            status: CheckStatus::Fail,
            details: details.clone(),
        })
    };

    if !probe {
        return skip_both("pass --probe to call the analysis service");
    }
    if credential != CredentialStatus::WellFormed {
        return skip_both("skipped because no well-formed credential is configured");
    }

    let client = match OpenAiClient::from_config(&config.llm) {
        Ok(Some(client)) => client,
        Ok(None) => return skip_both("skipped because no credential is configured"),
        Err(error) => return fail_both(error.to_string()),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return fail_both(format!("failed to initialize async runtime: {error}")),
    };

    let models = match runtime.block_on(diagnostics::probe(&client)) {
        Ok(report) => {
            let availability = if report.lists_model(client.model()) {
                "is available"
            } else {
                "was not listed"
            };
            DoctorCheck {
                name: MODEL_PROBE,
                status: CheckStatus::Pass,
                details: format!(
                    "service answered in {}ms with {} models; `{}` {availability}",
                    report.elapsed.as_millis(),
                    report.models.len(),
                    client.model()
                ),
            }
        }
        Err(error) => DoctorCheck {
            name: MODEL_PROBE,
            status: CheckStatus::Fail,
            details: diagnostics::describe_probe_failure(&error),
        },
    };

    let completion = match runtime.block_on(diagnostics::probe_completion(&client)) {
        Ok(reply) => DoctorCheck {
            name: COMPLETION_PROBE,
            status: CheckStatus::Pass,
            details: format!(
                "`{}` completed a chat request in {}ms: {}",
                client.model(),
                reply.elapsed.as_millis(),
                reply.reply
            ),
        },
        Err(error) => DoctorCheck {
            name: COMPLETION_PROBE,
            status: CheckStatus::Fail,
            details: diagnostics::describe_probe_failure(&error),
        },
    };

    [models, completion]
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());
    lines.push(format!("analysis mode: {}", report.analysis_mode));

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
