use sling_core::{DeploymentOptions, OptionKey};

use crate::RenderError;
use crate::dockerfile::GIT_TOKEN_BUILD_ARG;

/// Render the docker-compose document declaring the application service.
///
/// The token build argument is listed without a value so docker-compose
/// takes it from the environment of the remote build command.
pub fn render(options: &DeploymentOptions) -> Result<String, RenderError> {
    let version = options.require(OptionKey::DockerVersion)?;
    let container = options.require(OptionKey::ContainerName)?;
    let dockerfile = options.require(OptionKey::DockerfileName)?;
    let runtime = options.require(OptionKey::NodeVersion)?;
    let host_port = options.require(OptionKey::HostPort)?;
    let container_port = options.require(OptionKey::ContainerPort)?;

    Ok(format!(
        r#"version: '{version}'
services:
  app:
    container_name: {container}
    build:
      context: .
      dockerfile: {dockerfile}
      args:
        - {GIT_TOKEN_BUILD_ARG}
    labels:
      - "runtime={runtime}"
    ports:
      - "{host_port}:{container_port}"
    environment:
      - CHOKIDAR_USEPOLLING=true
"#
    ))
}
