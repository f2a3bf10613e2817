//! Replay script generation for recorded remote method calls.
//!
//! This crate turns the argument and return-value graphs captured in a
//! [`CallRecord`](rmirec_storage::CallRecord) into scripts that rebuild
//! those values, and packages them as replay artifacts.
//!
//! # Modules
//!
//! - [`error`] -- Error types for compilation and recording failures
//! - [`literal`] -- Escaped text and suffixed numeric literals
//! - [`naming`] -- Variable names derived from runtime types
//! - [`scriptlet`] -- Object graph compiler producing declaration/statement scriptlets
//! - [`remote`] -- Remote-reference path scanner for return values
//! - [`recorder`] -- Recording pipeline emitting sampler and post-processor artifacts

pub mod error;
pub mod literal;
pub mod naming;
pub mod recorder;
pub mod remote;
pub mod scriptlet;

pub use error::CodegenError;
pub use recorder::{GeneratedArtifacts, Recorder};
pub use remote::{annotate_remote_returns, find_remote_paths};
pub use scriptlet::{Scriptlet, ScriptletGenerator};

use serde::{Deserialize, Serialize};

/// Options controlling the text the object graph compiler emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Helper invoked with a class literal to build an instance without
    /// running any constructor. Used for types lacking a no-argument
    /// constructor.
    pub bypass_constructor: String,

    /// Banner placed between the declaration and statement sections of a
    /// rendered scriptlet.
    pub separator: String,

    /// Deepest chain of nested objects compiled before giving up with
    /// [`CodegenError::NestingTooDeep`].
    pub max_depth: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            bypass_constructor: "rmirec.util.ReflectionUtil.newInstance".to_string(),
            separator: "// -------------------------------".to_string(),
            max_depth: 128,
        }
    }
}

/// Options controlling the recording pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderOptions {
    pub generator: GeneratorOptions,

    /// Sampler display name. `{index}`, `{target}` and `{method}` are
    /// substituted with the call's index, target name and method name.
    pub name_format: String,

    /// Class of the remote-instance registry used by result scripts.
    pub registry_class: String,

    /// Replay variable under which the registry is stored.
    pub registry_variable: String,

    /// Expression naming the previous sample in the replay environment.
    pub previous_result: String,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        RecorderOptions {
            generator: GeneratorOptions::default(),
            name_format: "{index} {target}.{method}".to_string(),
            registry_class: "rmirec.InstanceRegistry".to_string(),
            registry_variable: "RMIRemoteObject.instances".to_string(),
            previous_result: "prev".to_string(),
        }
    }
}
