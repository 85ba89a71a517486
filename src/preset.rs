use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::classify::{ClassBreaks, Method};
use crate::color::{ColorScheme, Interpolation, Rgba};
use crate::error::{Result, ThematicError};
use crate::style::{LabelFormat, LabelStyle, RampSource, StyleSpec};

/// Version written into every preset file.
pub const SCHEMA_VERSION: u64 = 1;

const EXTENSION: &str = "json";

// ---------------------------------------------------------------------------
// On-disk format
// ---------------------------------------------------------------------------

/// Serialized form of a [`StyleSpec`]. Labels are derived, so not stored.
#[derive(Debug, Serialize, Deserialize)]
struct PresetFile {
    schema_version: u64,
    field: String,
    method: Method,
    class_count: usize,
    breaks: Vec<f64>,
    colors: Vec<Rgba>,
    border_color: Rgba,
    border_width: f64,
    opacity: f64,
    label_format: LabelFormat,
    #[serde(default)]
    color_scheme: Option<ColorScheme>,
    #[serde(default)]
    reversed: bool,
    #[serde(default)]
    interpolation: Interpolation,
    #[serde(default)]
    feature_labels: Option<LabelStyle>,
}

impl PresetFile {
    fn from_spec(spec: &StyleSpec) -> Self {
        let ramp = spec.ramp().copied();
        PresetFile {
            schema_version: SCHEMA_VERSION,
            field: spec.field().to_string(),
            method: spec.method(),
            class_count: spec.class_count(),
            breaks: spec.breaks().as_slice().to_vec(),
            colors: spec.colors().to_vec(),
            border_color: spec.border_color(),
            border_width: spec.border_width(),
            opacity: spec.opacity(),
            label_format: spec.label_format().clone(),
            color_scheme: ramp.map(|r| r.scheme),
            reversed: ramp.is_some_and(|r| r.reversed),
            interpolation: ramp.map(|r| r.interpolation).unwrap_or_default(),
            feature_labels: spec.feature_labels().cloned(),
        }
    }

    fn into_spec(self) -> Result<StyleSpec> {
        if self.class_count + 1 != self.breaks.len() {
            return Err(ThematicError::Validation(format!(
                "class_count {} does not match {} breaks",
                self.class_count,
                self.breaks.len()
            )));
        }
        let ramp = self.color_scheme.map(|scheme| {
            RampSource::new(scheme, self.reversed).with_interpolation(self.interpolation)
        });
        StyleSpec::build(
            ClassBreaks::new(self.breaks)?,
            self.colors,
            self.border_color,
            self.border_width,
            self.opacity,
            self.field,
            self.method,
        )?
        .with_label_format(self.label_format)
        .with_ramp(ramp)
        .with_feature_labels(self.feature_labels)
    }
}

/// Bring a parsed document up to [`SCHEMA_VERSION`].
fn migrate(value: Value) -> std::result::Result<Value, String> {
    let version = value
        .get("schema_version")
        .ok_or_else(|| "missing schema_version".to_string())?
        .as_u64()
        .ok_or_else(|| "schema_version is not a non-negative integer".to_string())?;
    match version {
        SCHEMA_VERSION => Ok(value),
        other => Err(format!(
            "unsupported schema_version {other} (expected {SCHEMA_VERSION})"
        )),
    }
}

/// Decode preset text; every failure is reported as corruption of `name`.
fn decode(name: &str, text: &str) -> Result<StyleSpec> {
    let value: Value = serde_json::from_str(text).map_err(|e| ThematicError::corrupt(name, e))?;
    let value = migrate(value).map_err(|reason| ThematicError::corrupt(name, reason))?;
    let file: PresetFile =
        serde_json::from_value(value).map_err(|e| ThematicError::corrupt(name, e))?;
    file.into_spec().map_err(|e| ThematicError::corrupt(name, e))
}

fn write_synced(tmp: &mut NamedTempFile, bytes: &[u8]) -> io::Result<()> {
    tmp.write_all(bytes)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()
}

/// Map a preset name to a file stem: ASCII letters, digits, `_` and `-` are
/// kept, anything else becomes `_`. Surrounding whitespace is ignored.
pub fn sanitize_name(name: &str) -> Result<String> {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        return Err(ThematicError::Validation(format!(
            "preset name '{name}' is empty"
        )));
    }
    Ok(stem)
}

// ---------------------------------------------------------------------------
// PresetStore
// ---------------------------------------------------------------------------

/// Named styles stored as one JSON file each in a directory.
///
/// The directory is created on the first save. Saves write a temporary file
/// next to the target and rename it into place, so readers never see a
/// partial preset. Saves and removals of the same name are serialised.
#[derive(Debug)]
pub struct PresetStore {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a preset name is stored in.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        Ok(self.file_path(&sanitize_name(name)?))
    }

    fn file_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.{EXTENSION}"))
    }

    /// Run `op` while holding the lock for `stem`.
    ///
    /// The map entry is dropped again once no other caller holds or waits
    /// on it, so the map only contains names with work in flight.
    fn with_name_lock<T>(&self, stem: &str, op: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(stem.to_string()).or_default())
        };
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            op()
        };

        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(stem);
        }
        result
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| ThematicError::storage(&self.dir, e))
    }

    /// Write `spec` under `name`, replacing any preset of the same name.
    pub fn save(&self, spec: &StyleSpec, name: &str) -> Result<PathBuf> {
        let stem = sanitize_name(name)?;
        let path = self.file_path(&stem);
        let text = serde_json::to_string_pretty(&PresetFile::from_spec(spec))
            .map_err(|e| ThematicError::storage(&path, io::Error::from(e)))?;

        self.with_name_lock(&stem, || {
            self.ensure_dir()?;

            // Dropping `tmp` on an early return deletes the temporary file.
            let mut tmp =
                NamedTempFile::new_in(&self.dir).map_err(|e| ThematicError::storage(&self.dir, e))?;
            write_synced(&mut tmp, text.as_bytes())
                .map_err(|e| ThematicError::storage(tmp.path(), e))?;
            tmp.persist(&path)
                .map_err(|e| ThematicError::storage(&path, e.error))?;
            Ok(())
        })?;

        log::info!("saved preset '{stem}' to {}", path.display());
        Ok(path)
    }

    /// Read the preset `name`.
    pub fn load(&self, name: &str) -> Result<StyleSpec> {
        let stem = sanitize_name(name)?;
        let path = self.file_path(&stem);
        let text = fs::read_to_string(&path).map_err(|e| ThematicError::storage(&path, e))?;
        let spec = decode(&stem, &text)?;
        log::info!(
            "loaded preset '{stem}' ({} classes on '{}')",
            spec.class_count(),
            spec.field()
        );
        Ok(spec)
    }

    /// Preset names in the directory, sorted. A missing directory holds none.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ThematicError::storage(&self.dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ThematicError::storage(&self.dir, e))?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete the preset `name`.
    pub fn remove(&self, name: &str) -> Result<()> {
        let stem = sanitize_name(name)?;
        let path = self.file_path(&stem);
        self.with_name_lock(&stem, || {
            fs::remove_file(&path).map_err(|e| ThematicError::storage(&path, e))
        })?;
        log::info!("removed preset '{stem}'");
        Ok(())
    }
}
