//! Per-image flag descriptor (`image_config.json`)
//!
//! The descriptor holds three optional flag lists. Every entry may reference
//! `{user_home}`, `{image_dir}`, `{image_tag}` and `{default_label}`; `{{` and
//! `}}` produce literal braces.

use crate::error::{DockError, DockResult};
use crate::files;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Label attached to every image built by dock, used to filter containers
/// and images when listing or pruning. Must never change.
pub const DEFAULT_LABEL: &str = "io.github.x11docker";

/// Separates x11docker options from docker run options
pub const RUN_FLAG_SEPARATOR: &str = "--";

/// On-disk shape of `image_config.json`.
///
/// Field order is the serialized key order, which is kept alphabetical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Descriptor {
    #[serde(rename = "dockerBuildFlags", alias = "buildFlags", default)]
    docker_build_flags: Vec<String>,

    #[serde(rename = "dockerRunFlags", alias = "runFlags", default)]
    docker_run_flags: Vec<String>,

    #[serde(rename = "x11dockerFlags", alias = "executorFlags", default)]
    x11docker_flags: Vec<String>,
}

impl Descriptor {
    fn default_template() -> Self {
        Self {
            docker_build_flags: vec![],
            docker_run_flags: vec!["--privileged".to_string()],
            x11docker_flags: vec![
                "--homedir={image_dir}/home".to_string(),
                "--desktop".to_string(),
                "--pulseaudio".to_string(),
            ],
        }
    }
}

/// Resolved flags for building and running one image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageConfig {
    x11docker_flags: Vec<String>,
    docker_run_flags: Vec<String>,
    build_flags: Vec<String>,
    run_flags: Vec<String>,
}

impl ImageConfig {
    pub fn new(
        x11docker_flags: Vec<String>,
        docker_run_flags: Vec<String>,
        build_flags: Vec<String>,
    ) -> Self {
        let run_flags = x11docker_flags
            .iter()
            .cloned()
            .chain(std::iter::once(RUN_FLAG_SEPARATOR.to_string()))
            .chain(docker_run_flags.iter().cloned())
            .collect();

        Self {
            x11docker_flags,
            docker_run_flags,
            build_flags,
            run_flags,
        }
    }

    /// Flags passed to x11docker ahead of the separator
    pub fn x11docker_flags(&self) -> &[String] {
        &self.x11docker_flags
    }

    /// Flags x11docker forwards to `docker run`
    pub fn docker_run_flags(&self) -> &[String] {
        &self.docker_run_flags
    }

    /// Flags for `docker build`, mandatory flags included
    pub fn build_flags(&self) -> &[String] {
        &self.build_flags
    }

    /// x11docker flags, the separator, then docker run flags
    pub fn run_flags(&self) -> &[String] {
        &self.run_flags
    }
}

/// Values available to descriptor placeholders
struct Variables<'a> {
    user_home: Option<String>,
    image_dir: String,
    image_tag: &'a str,
}

impl Variables<'_> {
    fn get(&self, name: &str) -> Result<String, String> {
        match name {
            "user_home" => self
                .user_home
                .clone()
                .ok_or_else(|| "home directory could not be determined".to_string()),
            "image_dir" => Ok(self.image_dir.clone()),
            "image_tag" => Ok(self.image_tag.to_string()),
            "default_label" => Ok(DEFAULT_LABEL.to_string()),
            other => Err(format!("unknown variable '{{{}}}'", other)),
        }
    }
}

fn interpolate(template: &str, vars: &Variables<'_>) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => return Err(format!("unclosed '{{' in \"{}\"", template)),
                    }
                }
                out.push_str(&vars.get(&name)?);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(format!("single '}}' in \"{}\"", template)),
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Load `configfile` and resolve it for the image at `image_dir` tagged `tag`.
///
/// `--rm`, `--tag` and `--label` are appended after the user's build flags so
/// they win under last-flag-wins parsing; `force` adds `--no-cache`.
pub fn load(configfile: &Path, image_dir: &Path, tag: &str, force: bool) -> DockResult<ImageConfig> {
    let path = files::expand(configfile);
    let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DockError::PathNotFound(path.clone()),
        _ => DockError::io(format!("reading {}", path.display()), e),
    })?;

    let malformed = |reason: String| DockError::ConfigInvalid {
        path: path.clone(),
        reason,
    };

    let descriptor: Descriptor =
        serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?;

    let vars = Variables {
        user_home: dirs::home_dir().map(|home| files::expand(home).display().to_string()),
        image_dir: files::expand(image_dir).display().to_string(),
        image_tag: tag,
    };
    let format_flags = |flags: Vec<String>| -> DockResult<Vec<String>> {
        flags
            .iter()
            .map(|flag| interpolate(flag, &vars).map_err(&malformed))
            .collect()
    };

    let mut build_flags = descriptor.docker_build_flags;
    build_flags.extend(
        ["--rm", "--tag={image_tag}", "--label={default_label}"]
            .iter()
            .map(|s| s.to_string()),
    );
    if force {
        build_flags.push("--no-cache".to_string());
    }

    let config = ImageConfig::new(
        format_flags(descriptor.x11docker_flags)?,
        format_flags(descriptor.docker_run_flags)?,
        format_flags(build_flags)?,
    );
    debug!("Loaded image config from {}: {:?}", path.display(), config);
    Ok(config)
}

/// Write the default descriptor to `configfile`, overwriting it.
pub fn dump_default(configfile: &Path) -> DockResult<()> {
    let path: PathBuf = files::expand(configfile);

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    Descriptor::default_template().serialize(&mut serializer)?;

    fs::write(&path, buf).map_err(|e| DockError::io(format!("writing {}", path.display()), e))
}
