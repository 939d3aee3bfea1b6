///! Cluster lifecycle commands

use super::Context;
use crate::output;
use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;
use sxtln_common::{ClusterService, CreateCluster, READY_STAGE};
use tokio_util::sync::CancellationToken;

#[derive(Subcommand)]
pub enum ClusterCommands {
    /// List clusters, or show one cluster
    Ls {
        /// Cluster ID
        cluster_id: Option<String>,
        #[arg(short = 'i', long = "id")]
        id: Option<String>,
    },
    /// Create a cluster (reuses an existing cluster with the same name)
    Create {
        /// Cluster name
        #[arg(short, long, default_value = "")]
        name: String,
        /// Type of each node in the cluster
        #[arg(short = 't', long = "type", default_value = "b1")]
        node_type: String,
        /// Number of nodes in the cluster
        #[arg(short = 'c', long = "count", default_value_t = 1)]
        node_count: u32,
        /// Wait for the cluster to become ready
        #[arg(short, long)]
        wait: bool,
        /// Create even if a cluster with the same name exists
        #[arg(short, long)]
        force: bool,
    },
    /// Delete a cluster
    Delete {
        /// Cluster ID
        cluster_id: Option<String>,
        #[arg(short = 'i', long = "id")]
        id: Option<String>,
    },
    /// Fetch a cluster's kubeconfig
    #[command(visible_aliases = ["config", "kc", "kube-config", "k8s"])]
    Kubeconfig {
        /// Cluster ID
        cluster_id: Option<String>,
        #[arg(short = 'i', long = "id")]
        id: Option<String>,
        /// Write to a file instead of stdout
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

/// `--id` wins over the positional form
fn resolve_id(flag: Option<String>, positional: Option<String>) -> Option<String> {
    flag.filter(|id| !id.is_empty())
        .or_else(|| positional.filter(|id| !id.is_empty()))
}

fn require_id(flag: Option<String>, positional: Option<String>) -> Result<String> {
    resolve_id(flag, positional)
        .ok_or_else(|| anyhow::anyhow!("you must set cluster id. use --id or -i"))
}

/// Cancel `token` when the user hits Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    })
}

pub async fn handle_cluster_command(command: ClusterCommands, ctx: &Context) -> Result<()> {
    let service = ClusterService::new(ctx.api()?);
    let format = ctx.output_format();

    match command {
        ClusterCommands::Ls { cluster_id, id } => {
            let id = resolve_id(id, cluster_id);
            let result = service.list(id.as_deref()).await?;
            output::print_single(&result, format)?;
        }

        ClusterCommands::Create {
            name,
            node_type,
            node_count,
            wait,
            force,
        } => {
            let request = CreateCluster {
                name,
                node_type,
                node_count,
                force,
                wait,
            };

            // Without --wait, Ctrl-C keeps its default behaviour
            let cancel = CancellationToken::new();
            let interrupt = request.wait.then(|| cancel_on_ctrl_c(cancel.clone()));

            let spinner = request.wait.then(|| {
                output::spinner(format!("Waiting for cluster '{}' to become ready...", request.name))
            });
            let result = service
                .create(&request, &cancel, |stage| {
                    if let Some(spinner) = &spinner {
                        spinner.set_message(format!(
                            "Waiting for cluster '{}' (stage {}/{})",
                            request.name, stage, READY_STAGE
                        ));
                    }
                })
                .await;

            if let Some(interrupt) = interrupt {
                interrupt.abort();
            }
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }

            output::print_single(&result?, format)?;
        }

        ClusterCommands::Delete { cluster_id, id } => {
            let id = require_id(id, cluster_id)?;
            service.delete(&id).await?;
            output::print_success(&format!("Cluster '{}' deleted", id));
        }

        ClusterCommands::Kubeconfig {
            cluster_id,
            id,
            file,
        } => {
            let id = require_id(id, cluster_id)?;
            let kubeconfig = service.kubeconfig(&id).await?;

            match file {
                Some(path) => {
                    std::fs::write(&path, &kubeconfig)?;
                    output::print_success(&format!("Kubeconfig written to {}", path.display()));
                }
                None => output::print_raw(&kubeconfig)?,
            }
        }
    }

    Ok(())
}
