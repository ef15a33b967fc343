//! Sample class, aspect, instance, and template fixtures for tests.

use anyhow::Result;
use std::fs;
use std::path::Path;

/// A sample `*.class.json` class definition.
#[derive(Clone, Debug)]
pub struct ClassFixture {
    pub name: String,
    pub content: String,
}

impl ClassFixture {
    /// A root class with no parent and a simple string-keyed schema.
    #[must_use]
    pub fn root(name: &str) -> Self {
        Self {
            name: name.to_string(),
            content: format!(
                r#"{{
  "$class": "{name}",
  "$schema": {{
    "type": "object",
    "properties": {{ "name": {{ "type": "string" }} }},
    "required": ["name"]
  }},
  "$fields": {{}},
  "$uses_aspects": []
}}"#
            ),
        }
    }

    /// A class that declares `$parent` and a set of usable aspects.
    #[must_use]
    pub fn with_parent(name: &str, parent: &str, uses_aspects: &[&str]) -> Self {
        let aspects = uses_aspects.iter().map(|a| format!("\"{a}\"")).collect::<Vec<_>>().join(", ");
        Self {
            name: name.to_string(),
            content: format!(
                r#"{{
  "$class": "{name}",
  "$parent": "{parent}",
  "$schema": {{ "type": "object", "properties": {{}} }},
  "$fields": {{}},
  "$uses_aspects": [{aspects}]
}}"#
            ),
        }
    }

    /// Write this fixture to `dir/<name>.class.json`.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(format!("{}.class.json", self.name)), &self.content)?;
        Ok(())
    }
}

/// A sample aspect definition (`$aspect == $class`, no parent or lineage).
#[derive(Clone, Debug)]
pub struct AspectFixture {
    pub name: String,
    pub content: String,
}

impl AspectFixture {
    #[must_use]
    pub fn basic(name: &str) -> Self {
        Self {
            name: name.to_string(),
            content: format!(
                r#"{{
  "$aspect": "{name}",
  "$class": "{name}",
  "$schema": {{ "type": "object", "properties": {{ "enabled": {{ "type": "boolean" }} }} }},
  "$defaults": {{ "enabled": true }}
}}"#
            ),
        }
    }

    pub fn write_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(format!("{}.class.json", self.name)), &self.content)?;
        Ok(())
    }
}

/// A sample instance definition.
#[derive(Clone, Debug)]
pub struct InstanceFixture {
    pub id: String,
    pub content: String,
}

impl InstanceFixture {
    #[must_use]
    pub fn basic(id: &str, class: &str) -> Self {
        Self {
            id: id.to_string(),
            content: format!(
                r#"{{
  "$id": "{id}",
  "$class": "{class}",
  "$aspects": {{}},
  "name": "{id}"
}}"#
            ),
        }
    }

    /// An instance that declares a render task pointing at `template`.
    #[must_use]
    pub fn with_render(id: &str, class: &str, template: &str, output: &str) -> Self {
        Self {
            id: id.to_string(),
            content: format!(
                r#"{{
  "$id": "{id}",
  "$class": "{class}",
  "$aspects": {{}},
  "$render": [{{ "template": "{template}", "output": "{output}" }}],
  "name": "{id}"
}}"#
            ),
        }
    }

    pub fn write_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(format!("{}.json", self.id)), &self.content)?;
        Ok(())
    }
}

/// A sample template file, Tera-flavored by default.
#[derive(Clone, Debug)]
pub struct TemplateFixture {
    pub name: String,
    pub content: String,
}

impl TemplateFixture {
    /// A template with no dependency on instance data, useful for tests
    /// that only care that a render task ran and wrote a file.
    #[must_use]
    pub fn simple(name: &str) -> Self {
        Self { name: name.to_string(), content: "rendered\n".to_string() }
    }

    /// A template that prints `instance_id`'s `name` field, looked up from
    /// `instances_by_id` (the map every adapter's render context exposes).
    #[must_use]
    pub fn instance_name(name: &str, instance_id: &str) -> Self {
        Self { name: name.to_string(), content: format!("{{{{ instances_by_id[\"{instance_id}\"].name }}}}\n") }
    }

    pub fn write_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &self.content)?;
        Ok(())
    }
}
