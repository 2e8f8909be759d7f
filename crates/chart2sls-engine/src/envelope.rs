//! Salt state envelope
//!
//! Wraps the substituted manifests in the Jinja prologue Salt needs: the
//! renderer shebang, the image macro import, one `import_yaml` / `set` pair
//! per service configuration, and the raw block that keeps chart content
//! from being interpreted.

use crate::magic::IMAGE_HELPER;

/// Opens the raw block around the manifests
pub const RAW_OPEN: &str = "{% raw %}";
/// Closes the raw block around the manifests
pub const RAW_CLOSE: &str = "{% endraw %}";

/// A service configuration exposed to the template as a Jinja variable
///
/// `name` is the variable holding the merged configuration, `config_map`
/// the ConfigMap overriding the chart's defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub name: String,
    pub config_map: String,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, config_map: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_map: config_map.into(),
        }
    }
}

/// Fixed parts of the prologue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeOptions {
    /// Salt render pipeline named in the shebang
    pub renderer: String,
    /// Salt file providing the image macro
    pub macro_source: String,
}

impl Default for EnvelopeOptions {
    fn default() -> Self {
        Self {
            renderer: "jinja | metalk8s_kubernetes".to_string(),
            macro_source: "metalk8s/repo/macro.sls".to_string(),
        }
    }
}

/// Prologue and epilogue for one chart
#[derive(Debug, Clone)]
pub struct Envelope<'a> {
    pub chart: &'a str,
    pub namespace: &'a str,
    pub service_configs: &'a [ServiceConfig],
    pub options: &'a EnvelopeOptions,
}

impl Envelope<'_> {
    /// Everything written before the manifests
    pub fn prologue(&self) -> String {
        let imports = self
            .service_configs
            .iter()
            .map(|config| {
                format!(
                    "{{% import_yaml 'metalk8s/addons/{chart}/config/{name}.yaml' as {name}_defaults with context %}}",
                    chart = self.chart,
                    name = config.name,
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let assignments = self
            .service_configs
            .iter()
            .map(|config| {
                format!(
                    "{{%- set {name} = salt.metalk8s_service_configuration.get_service_conf('{namespace}', '{config_map}', {name}_defaults) %}}",
                    name = config.name,
                    namespace = self.namespace,
                    config_map = config.config_map,
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "#!{renderer}\n\n{{%- from \"{source}\" import {helper} with context %}}\n{imports}\n{assignments}\n\n{RAW_OPEN}\n\n",
            renderer = self.options.renderer,
            source = self.options.macro_source,
            helper = IMAGE_HELPER,
        )
    }

    /// Everything written after the manifests
    pub fn epilogue(&self) -> String {
        format!("\n{RAW_CLOSE}\n")
    }

    /// Complete state file around `body`
    pub fn wrap(&self, body: &str) -> String {
        let prologue = self.prologue();
        let epilogue = self.epilogue();

        let mut out = String::with_capacity(prologue.len() + body.len() + epilogue.len());
        out.push_str(&prologue);
        out.push_str(body);
        out.push_str(&epilogue);
        out
    }
}
