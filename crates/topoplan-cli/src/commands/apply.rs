use crate::{
    commands::read_deployment,
    config::Config,
    display::{
        display_plan, display_report, print_info, print_success, print_warning, prompt_confirm,
    },
    CliError, Result,
};
use clap::Args;
use log::info;
use std::path::PathBuf;
use topoplan_api::{HttpProvisioningClient, InMemoryBackend, ProvisioningBackend, Provisioner};
use topoplan_core::{derive_plan, TopologyPlan};
use topoplan_utils::format_plan_summary;

/// Command-line arguments for the `apply` command.
///
/// Derives the plan and provisions it through the configured backend:
/// network, edge, instances and target groups first, then listeners and
/// rules in priority order, and finally DNS records and credentials.
///
/// # Examples
/// ```bash
/// # See what would be created, without calling the backend
/// topoplan apply --dry-run
///
/// # Provision without the confirmation prompt
/// topoplan apply -f prod.json -y
/// ```
///
/// A failed apply is not rolled back; resources created before the failure
/// stay in place.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Deployment file (JSON, or TOML by extension)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Provision against an in-memory backend instead of the remote API
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub async fn handle(args: ApplyArgs, config: &Config) -> Result<()> {
    let settings = read_deployment(args.file, config)?;
    let plan = derive_plan(&settings)?;

    display_plan(&plan);
    println!();

    if args.dry_run {
        print_info("Dry run: provisioning against the in-memory backend");
        return provision(&plan, InMemoryBackend::new()).await;
    }

    if !args.yes {
        let prompt = format!("Provision {}?", format_plan_summary(&plan));
        if !prompt_confirm(&prompt, false)? {
            print_warning("Apply cancelled");
            return Ok(());
        }
    }

    let client = HttpProvisioningClient::from_config(config)?;
    if !client.test_connection().await? {
        return Err(CliError::OperationFailed(format!(
            "provisioning API at {} is not reachable",
            client.base_url()
        )));
    }

    info!("Provisioning through {}", client.base_url());
    provision(&plan, client).await
}

async fn provision<B: ProvisioningBackend>(plan: &TopologyPlan, backend: B) -> Result<()> {
    let provisioner = Provisioner::new(backend);
    let report = provisioner.apply(plan).await?;

    display_report(&report);
    print_success(&format!(
        "Provisioned {} resources for '{}'",
        report.len(),
        report.prefix
    ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::workspace;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn args(file: PathBuf, dry_run: bool) -> ApplyArgs {
        ApplyArgs {
            file: Some(file),
            dry_run,
            yes: true,
        }
    }

    #[tokio::test]
    async fn test_dry_run_needs_no_backend() {
        let (_dir, config, path) = workspace(&["shop", "blog"], true);
        assert!(handle(args(path, true), &config).await.is_ok());
    }

    #[tokio::test]
    async fn test_apply_against_remote_backend() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "physicalId": "res-1" })),
            )
            .mount(&server)
            .await;

        let (_dir, mut config, path) = workspace(&["shop"], false);
        config.set_api_key("abcd1234efgh5678").unwrap();
        config.set_base_url(&server.uri()).unwrap();

        assert!(handle(args(path, false), &config).await.is_ok());

        let posts = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.method.as_str() == "POST")
            .count();
        // network, zone, three groups, lb, two step hosts, two instances,
        // target group, listener, rule, record, credential
        assert_eq!(posts, 15);
    }

    #[tokio::test]
    async fn test_apply_stops_when_backend_unhealthy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let (_dir, mut config, path) = workspace(&["shop"], false);
        config.set_api_key("abcd1234efgh5678").unwrap();
        config.set_base_url(&server.uri()).unwrap();

        assert!(matches!(
            handle(args(path, false), &config).await,
            Err(CliError::OperationFailed(_))
        ));
    }
}
