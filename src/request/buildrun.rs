use std::collections::BTreeMap;
use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use super::RequestError;

/// Reference to the build definition a run executes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRef {
    /// Build name.
    pub name: String,
    /// API version of the referenced build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Service account the run executes under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    /// Existing service account name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Generate a service account for this run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate: Option<bool>,
}

/// Reference to a secret in the same namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalObjectReference {
    /// Secret name.
    pub name: String,
}

/// Output image of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image reference to push.
    pub image: String,
    /// Push credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<LocalObjectReference>,
    /// Labels added to the image.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations added to the image.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Environment variable passed to every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name.
    pub name: String,
    /// Variable value.
    pub value: String,
}

/// Spec of a build-run request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRunSpec {
    /// Build to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_ref: Option<BuildRef>,
    /// Service account override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<ServiceAccount>,
    /// Run timeout override.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Output image override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Image>,
    /// Environment overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,
}

impl BuildRunSpec {
    /// Replaces optional sub-structures left at their zero value with `None`.
    ///
    /// - build ref: empty name and an api version set to `""` (an unset api version keeps it)
    /// - service account: empty (or unset) name and generation not requested
    /// - output credentials: empty secret name
    /// - output: empty image and no credentials
    /// - timeout: zero
    /// - env: empty
    pub fn sanitize(&mut self) {
        if self
            .build_ref
            .as_ref()
            .is_some_and(|r| r.name.is_empty() && r.api_version.as_deref() == Some(""))
        {
            self.build_ref = None;
        }

        if self.service_account.as_ref().is_some_and(|sa| {
            sa.name.as_deref().map_or(true, str::is_empty) && !sa.generate.unwrap_or(false)
        }) {
            self.service_account = None;
        }

        if let Some(output) = self.output.as_mut() {
            if output
                .credentials
                .as_ref()
                .is_some_and(|c| c.name.is_empty())
            {
                output.credentials = None;
            }
            if output.image.is_empty() && output.credentials.is_none() {
                self.output = None;
            }
        }

        if self.timeout.is_some_and(|t| t.is_zero()) {
            self.timeout = None;
        }

        if self.env.as_ref().is_some_and(Vec::is_empty) {
            self.env = None;
        }
    }

    /// Returns the sanitized copy of `self`.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }
}

/// Command-line flags shaping a build-run request.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildRunArgs {
    /// Name of the build to run.
    #[arg(long = "buildref-name", default_value = "")]
    pub buildref_name: String,

    /// API version of the referenced build.
    #[arg(long = "buildref-apiversion", default_value = "")]
    pub buildref_api_version: String,

    /// Service account name to run the build with.
    #[arg(long = "sa-name", default_value = "")]
    pub sa_name: String,

    /// Generate a service account for the run.
    #[arg(long = "sa-generate")]
    pub sa_generate: bool,

    /// Timeout for the run, e.g. `10m` or `1h 30m`.
    #[arg(long = "timeout", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Output image reference.
    #[arg(long = "output-image", default_value = "")]
    pub output_image: String,

    /// Secret holding the output image push credentials.
    #[arg(long = "output-credentials-secret", default_value = "")]
    pub output_credentials_secret: String,

    /// Environment variable for every step, `KEY=VALUE` (repeatable).
    #[arg(short = 'e', long = "env", value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Label added to the output image, `KEY=VALUE` (repeatable).
    #[arg(long = "output-image-label", value_parser = parse_key_value)]
    pub output_image_labels: Vec<(String, String)>,

    /// Annotation added to the output image, `KEY=VALUE` (repeatable).
    #[arg(long = "output-image-annotation", value_parser = parse_key_value)]
    pub output_image_annotations: Vec<(String, String)>,
}

impl BuildRunArgs {
    /// Builds the unsanitized spec; every sub-structure is present, possibly empty.
    pub fn to_spec(&self) -> BuildRunSpec {
        BuildRunSpec {
            build_ref: Some(BuildRef {
                name: self.buildref_name.clone(),
                api_version: Some(self.buildref_api_version.clone()),
            }),
            service_account: Some(ServiceAccount {
                name: Some(self.sa_name.clone()),
                generate: Some(self.sa_generate),
            }),
            timeout: Some(self.timeout.unwrap_or_default()),
            output: Some(Image {
                image: self.output_image.clone(),
                credentials: Some(LocalObjectReference {
                    name: self.output_credentials_secret.clone(),
                }),
                labels: self.output_image_labels.iter().cloned().collect(),
                annotations: self.output_image_annotations.iter().cloned().collect(),
            }),
            env: Some(
                self.env
                    .iter()
                    .map(|(name, value)| EnvVar {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect(),
            ),
        }
    }
}

/// Parses a `KEY=VALUE` flag; the value may be empty or contain `=`.
///
/// # Example
/// ```
/// use podreactor::request::parse_key_value;
///
/// assert_eq!(
///     parse_key_value("GOFLAGS=-mod=vendor").unwrap(),
///     ("GOFLAGS".to_string(), "-mod=vendor".to_string()),
/// );
/// assert!(parse_key_value("novalue").is_err());
/// ```
pub fn parse_key_value(input: &str) -> Result<(String, String), RequestError> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(RequestError::InvalidKeyValue {
            input: input.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        args: BuildRunArgs,
    }

    fn spec_from(argv: &[&str]) -> BuildRunSpec {
        let cli = Cli::try_parse_from(std::iter::once("shp").chain(argv.iter().copied()))
            .expect("flags should parse");
        cli.args.to_spec().sanitized()
    }

    #[test]
    fn no_flags_yield_empty_request() {
        let spec = spec_from(&[]);
        assert_eq!(spec, BuildRunSpec::default());
        assert_eq!(serde_json::to_value(&spec).unwrap(), json!({}));
    }

    #[test]
    fn unsanitized_spec_carries_empty_structures() {
        let cli = Cli::try_parse_from(["shp"]).unwrap();
        let value = serde_json::to_value(cli.args.to_spec()).unwrap();
        assert_eq!(value["buildRef"], json!({ "name": "", "apiVersion": "" }));
        assert_eq!(value["env"], json!([]));
    }

    #[test]
    fn populated_flags_survive_sanitize() {
        let spec = spec_from(&[
            "--buildref-name",
            "go-build",
            "--sa-generate",
            "--timeout",
            "10m",
            "--output-image",
            "registry.local/app:latest",
            "--output-image-label",
            "team=ci",
            "-e",
            "GOOS=linux",
        ]);

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["buildRef"]["name"], "go-build");
        assert_eq!(value["serviceAccount"], json!({ "name": "", "generate": true }));
        assert_eq!(value["timeout"], "10m");
        assert_eq!(value["output"]["image"], "registry.local/app:latest");
        assert_eq!(value["output"]["labels"], json!({ "team": "ci" }));
        assert!(value["output"].get("credentials").is_none());
        assert_eq!(value["env"], json!([{ "name": "GOOS", "value": "linux" }]));
    }

    #[test]
    fn credentials_alone_keep_output() {
        let spec = spec_from(&["--output-credentials-secret", "push-secret"]);
        let output = spec.output.expect("output kept");
        assert!(output.image.is_empty());
        assert_eq!(output.credentials.unwrap().name, "push-secret");
    }

    #[test]
    fn build_ref_without_api_version_is_kept() {
        let mut spec = BuildRunSpec {
            build_ref: Some(BuildRef::default()),
            ..BuildRunSpec::default()
        };
        spec.sanitize();
        assert_eq!(spec.build_ref, Some(BuildRef::default()));

        spec.build_ref = Some(BuildRef {
            name: String::new(),
            api_version: Some(String::new()),
        });
        spec.sanitize();
        assert_eq!(spec.build_ref, None);
    }

    #[test]
    fn invalid_env_flag_is_rejected() {
        assert!(Cli::try_parse_from(["shp", "-e", "=oops"]).is_err());
        assert_eq!(
            parse_key_value("KEY"),
            Err(RequestError::InvalidKeyValue {
                input: "KEY".into()
            })
        );
    }
}
