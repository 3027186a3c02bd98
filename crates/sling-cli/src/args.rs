use std::path::PathBuf;

use clap::Args;
use sling_core::{OptionKey, Overrides, Variant};

/// Flags shared by every subcommand.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Deployment variant: container (docker-compose) or static (nginx)
    #[arg(long)]
    pub variant: Option<Variant>,
    /// Directory the rendered artifacts are written to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

/// Remote-only flags for `sling deploy`.
#[derive(Args, Debug)]
pub struct RemoteArgs {
    /// Passphrase for the SSH private key
    #[arg(long, env = "SLING_KEY_PASSPHRASE", hide_env_values = true)]
    pub key_passphrase: Option<String>,
    /// Per-stage timeout in seconds (overrides [remote].stage_timeout_secs)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub stage_timeout: Option<u64>,
}

/// Deployment option overrides. Each flag also accepts its camelCase spelling,
/// e.g. `--nodeVersion=node:18-alpine`.
#[derive(Args, Debug, Default)]
pub struct OptionArgs {
    /// Base image for the build file [default: node:16-alpine]
    #[arg(long, visible_alias = "nodeVersion", value_name = "IMAGE")]
    pub node_version: Option<String>,
    /// Working directory inside the image [default: /app]
    #[arg(long, visible_alias = "workDirectory", value_name = "PATH")]
    pub work_directory: Option<String>,
    /// Compose file name [default: docker.compose.yml]
    #[arg(long, visible_alias = "dockerComposeFilename", value_name = "FILE")]
    pub docker_compose_filename: Option<String>,
    /// Build file name [default: Dockerfile]
    #[arg(long, visible_alias = "dockerfileName", value_name = "FILE")]
    pub dockerfile_name: Option<String>,
    /// Proxy config file name [default: nginx.conf]
    #[arg(long, visible_alias = "proxyConfigFilename", value_name = "FILE")]
    pub proxy_config_filename: Option<String>,
    /// Compose file format version [default: 3.3]
    #[arg(long, visible_alias = "dockerVersion", value_name = "VERSION")]
    pub docker_version: Option<String>,
    /// Container name [default: my-app]
    #[arg(long, visible_alias = "containerName", value_name = "NAME")]
    pub container_name: Option<String>,
    /// Port the app listens on inside the container [default: 80]
    #[arg(long, visible_alias = "containerPort", value_name = "PORT")]
    pub container_port: Option<String>,
    /// Port published on the host [default: 80]
    #[arg(long, visible_alias = "hostPort", value_name = "PORT")]
    pub host_port: Option<String>,
    /// Repository user
    #[arg(long, visible_alias = "gitUser", value_name = "USER")]
    pub git_user: Option<String>,
    /// Repository access token
    #[arg(
        long,
        visible_alias = "gitToken",
        value_name = "TOKEN",
        env = "SLING_GIT_TOKEN",
        hide_env_values = true
    )]
    pub git_token: Option<String>,
    /// Repository owner account
    #[arg(long, visible_alias = "gitAccount", value_name = "ACCOUNT")]
    pub git_account: Option<String>,
    /// Repository name
    #[arg(long, visible_alias = "repoName", value_name = "REPO")]
    pub repo_name: Option<String>,
    /// Target host address
    #[arg(long, value_name = "ADDR")]
    pub host: Option<String>,
    /// Public server name for the proxy config [default: host]
    #[arg(long, visible_alias = "serverName", value_name = "NAME")]
    pub server_name: Option<String>,
    /// SSH login user [default: root]
    #[arg(long, visible_alias = "sshUser", value_name = "USER")]
    pub ssh_user: Option<String>,
    /// SSH port [default: 22]
    #[arg(long, visible_alias = "sshPort", value_name = "PORT")]
    pub ssh_port: Option<String>,
    /// SSH private key [default: ~/.ssh/id_rsa]
    #[arg(long, visible_alias = "sshKey", value_name = "PATH")]
    pub ssh_key: Option<String>,
    /// Directory on the target the artifacts are copied into [default: deploy]
    #[arg(long, visible_alias = "remoteDir", value_name = "PATH")]
    pub remote_dir: Option<String>,
}

impl OptionArgs {
    fn pairs(&self) -> [(OptionKey, &Option<String>); 19] {
        [
            (OptionKey::NodeVersion, &self.node_version),
            (OptionKey::WorkDirectory, &self.work_directory),
            (OptionKey::DockerComposeFilename, &self.docker_compose_filename),
            (OptionKey::DockerfileName, &self.dockerfile_name),
            (OptionKey::ProxyConfigFilename, &self.proxy_config_filename),
            (OptionKey::DockerVersion, &self.docker_version),
            (OptionKey::ContainerName, &self.container_name),
            (OptionKey::ContainerPort, &self.container_port),
            (OptionKey::HostPort, &self.host_port),
            (OptionKey::GitUser, &self.git_user),
            (OptionKey::GitToken, &self.git_token),
            (OptionKey::GitAccount, &self.git_account),
            (OptionKey::RepoName, &self.repo_name),
            (OptionKey::Host, &self.host),
            (OptionKey::ServerName, &self.server_name),
            (OptionKey::SshUser, &self.ssh_user),
            (OptionKey::SshPort, &self.ssh_port),
            (OptionKey::SshKey, &self.ssh_key),
            (OptionKey::RemoteDir, &self.remote_dir),
        ]
    }

    /// The flags that were given, as an override layer.
    pub fn overrides(&self) -> Overrides {
        let mut layer = Overrides::new();
        for (key, value) in self.pairs() {
            if let Some(value) = value {
                layer.set(key, value.as_str());
            }
        }
        layer
    }
}
