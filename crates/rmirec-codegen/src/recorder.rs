//! Recording pipeline.
//!
//! Turns a completed [`CallRecord`] into a sampler artifact whose script
//! rebuilds the call's arguments and, when the call returned remote
//! references, a post-processor artifact that registers them. Artifacts
//! are handed to an [`ArtifactSink`].

use std::borrow::Cow;

use rmirec_storage::hash::{artifact_id_for_record, derived_artifact_id};
use rmirec_storage::{
    ArgumentPacker, Arguments, ArtifactSink, BincodePacker, CallRecord, PostProcessorArtifact,
    SamplerArtifact,
};

use crate::error::CodegenError;
use crate::literal::escape_java;
use crate::scriptlet::ScriptletGenerator;
use crate::RecorderOptions;

/// Display name of the post-processor that registers returned remotes.
pub const POST_PROCESSOR_NAME: &str = "Save remote in return value";

/// Script body for calls without arguments.
pub const NO_ARGUMENTS_SCRIPT: &str = "// No arguments\nmethodArgs ( ) { return null; }";

/// The artifacts generated for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    pub sampler: SamplerArtifact,
    pub post_processor: Option<PostProcessorArtifact>,
}

/// Generates replay artifacts for recorded calls.
pub struct Recorder {
    options: RecorderOptions,
    packer: Box<dyn ArgumentPacker>,
}

impl Recorder {
    /// A recorder using the default bincode argument packer.
    pub fn new(options: RecorderOptions) -> Self {
        Recorder::with_packer(options, Box::new(BincodePacker))
    }

    /// A recorder that rehydrates arguments with `packer`.
    pub fn with_packer(options: RecorderOptions, packer: Box<dyn ArgumentPacker>) -> Self {
        Recorder { options, packer }
    }

    pub fn options(&self) -> &RecorderOptions {
        &self.options
    }

    /// Builds the artifacts for `record` and delivers them to `sink`.
    pub fn record_call(
        &self,
        record: &CallRecord,
        sink: &mut dyn ArtifactSink,
    ) -> Result<GeneratedArtifacts, CodegenError> {
        let artifacts = self.build_artifacts(record)?;
        sink.deliver(&artifacts.sampler, artifacts.post_processor.as_ref(), record)?;
        tracing::info!(
            artifact = %artifacts.sampler.id,
            index = record.index(),
            method = record.method_name(),
            post_processor = artifacts.post_processor.is_some(),
            "recorded call"
        );
        Ok(artifacts)
    }

    /// Builds the artifacts for `record` without delivering them.
    pub fn build_artifacts(&self, record: &CallRecord) -> Result<GeneratedArtifacts, CodegenError> {
        let sampler = SamplerArtifact {
            id: artifact_id_for_record(record),
            name: self.sampler_name(record),
            target: record.target().to_string(),
            method_name: record.method_name().to_string(),
            arguments_script: self.arguments_script(record)?,
        };
        let post_processor = self.result_script(record).map(|script| PostProcessorArtifact {
            id: derived_artifact_id(&sampler.id, "post-processor"),
            name: POST_PROCESSOR_NAME.to_string(),
            script,
            reset_interpreter: true,
            runs_after: sampler.id.clone(),
        });
        Ok(GeneratedArtifacts {
            sampler,
            post_processor,
        })
    }

    /// Renders the sampler name from the configured name format.
    pub fn sampler_name(&self, record: &CallRecord) -> String {
        self.options
            .name_format
            .replace("{index}", &record.index().to_string())
            .replace("{target}", record.target())
            .replace("{method}", record.method_name())
    }

    /// Builds the script that returns the call's reconstructed arguments.
    ///
    /// Each non-null argument is compiled into its own variable, named after
    /// its type and position. Declared argument types, when the record has
    /// them, only serve as hints for null values; the argument count always
    /// comes from the arguments themselves.
    pub fn arguments_script(&self, record: &CallRecord) -> Result<String, CodegenError> {
        let arguments = self.arguments(record)?;
        if arguments.is_empty() {
            return Ok(NO_ARGUMENTS_SCRIPT.to_string());
        }
        tracing::debug!(
            method = record.method_name(),
            arguments = arguments.len(),
            "creating arguments script"
        );

        let types = record.argument_types().unwrap_or_default();
        let mut generator = ScriptletGenerator::new(&arguments.heap, &self.options.generator);
        let mut script = format!(
            "// $Tag '{}'\nsetAccessibility(true);\nmethodArgs ( ) {{\n",
            method_key(record)
        );
        let mut names = Vec::with_capacity(arguments.len());
        for (i, argument) in arguments.values.iter().enumerate() {
            if argument.is_null() {
                names.push("null".to_string());
                continue;
            }
            let name = format!("{}{i}", generator.variable_name_for(argument)?);
            script.push_str(&generator.generate(argument, &name, types.get(i))?);
            names.push(name);
        }
        script.push_str(&format!(
            "Object[] args = new Object[] {{ {} }};\nreturn args;\n}}\n",
            names.join(", ")
        ));
        Ok(script)
    }

    /// Builds the script that registers remote references found in the
    /// call's return value, or `None` unless the record is marked as having
    /// returned remotes. A marked record with no paths still gets the
    /// script header.
    pub fn result_script(&self, record: &CallRecord) -> Option<String> {
        if !record.is_remote_returned() {
            return None;
        }
        let mut script = format!(
            "Object ret = {}.getReturnValue();\n{} reg = vars.getObject(\"{}\");\n\
             // ret: actual object path to remote reference\n",
            self.options.previous_result,
            self.options.registry_class,
            escape_java(&self.options.registry_variable),
        );
        for (handle, path) in record.remote_paths_in_return() {
            script.push_str(&format!(
                "reg.registerRmiInstance(\"{}\", ret{path});\n",
                escape_java(handle)
            ));
        }
        Some(script)
    }

    fn arguments<'r>(&self, record: &'r CallRecord) -> Result<Cow<'r, Arguments>, CodegenError> {
        Ok(match record.arguments() {
            Some(arguments) => Cow::Borrowed(arguments),
            None => Cow::Owned(self.packer.unpack(record.packed_arguments())?),
        })
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Recorder::new(RecorderOptions::default())
    }
}

/// Traceability key embedded in generated scripts: mangled signature and
/// call index.
pub fn method_key(record: &CallRecord) -> String {
    format!("{}#{}", record.mangled_signature(), record.index())
}
