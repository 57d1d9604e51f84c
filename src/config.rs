use crate::{
    error::ConfigError,
    fix_path,
    job::{JobDescriptor, OptionsMode},
    logging::*,
    utils::FixPath,
};

use ron::{extensions::Extensions, Options, Value};
use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer,
};
use std::{
    collections::HashSet,
    fmt, fs,
    path::{Path, PathBuf},
};

/// Only top-level entries whose name starts with this prefix are jobs.
pub const ENTRY_PREFIX: &str = "CONFIG";

/// Job descriptors in the order they appear in the configuration file.
pub type JobMap = Vec<(String, JobDescriptor)>;

/// Required keys of a job entry, each with the names it was known by in
/// older configuration files.
const REQUIRED_KEYS: [(&str, &[&str]); 3] = [
    ("enabled", &[]),
    ("source_dir", &["ori_dir"]),
    ("dest_dir", &["des_dir"]),
];

/// Shape of a single job entry as written in the configuration file.
#[derive(Deserialize)]
struct RawJob {
    enabled: bool,
    #[serde(alias = "ori_dir")]
    source_dir: String,
    #[serde(alias = "des_dir")]
    dest_dir: String,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default, alias = "addoptions")]
    options: Vec<String>,
    #[serde(default)]
    options_mode: OptionsMode,
}

/// Top-level map of the configuration file, keeping document order.
///
/// Values stay untyped at this point: entries that are not jobs may hold
/// anything.
struct Entries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Entries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of named configuration entries")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Entries, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<Value, Value>()? {
                    match key {
                        Value::String(name) => entries.push((name, value)),
                        other => debug!("Ignoring entry with non-string key {other:?}"),
                    }
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Reads and validates the configuration file at `filepath`.
///
/// A leading `~` in the path is expanded. The result lists every job entry
/// in file order, disabled ones included; nothing is returned unless all of
/// them are valid.
pub fn load_config(filepath: &Path) -> Result<JobMap, ConfigError> {
    let path = PathBuf::from(
        filepath
            .fix_path()
            .unwrap_or_else(|| filepath.to_string_lossy().to_string()),
    );

    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
        path: path.clone(),
        source,
    })?;
    debug!("Configuration file: {}", path.display());

    parse_config(&contents, &path)
}

/// Parses configuration text. `path` is only used in error messages.
pub fn parse_config(contents: &str, path: &Path) -> Result<JobMap, ConfigError> {
    let malformed = |message: String| ConfigError::Malformed {
        path: path.to_path_buf(),
        message,
    };

    let Entries(entries) = Options::default()
        .with_default_extension(Extensions::IMPLICIT_SOME)
        .from_str(contents)
        .map_err(|e| malformed(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut jobs = JobMap::new();

    for (name, value) in entries {
        let Value::Map(map) = value else {
            debug!("Ignoring entry {name}: not a record");
            continue;
        };
        if !name.starts_with(ENTRY_PREFIX) {
            debug!("Ignoring entry {name}: no {ENTRY_PREFIX} prefix");
            continue;
        }
        if !seen.insert(name.clone()) {
            return Err(malformed(format!("duplicate entry {name}")));
        }

        for (key, aliases) in REQUIRED_KEYS {
            let present = map.iter().any(|(k, _)| match k {
                Value::String(k) => k == key || aliases.iter().any(|alias| k == alias),
                _ => false,
            });
            if !present {
                return Err(ConfigError::Incomplete { entry: name, key });
            }
        }

        let raw: RawJob = Value::Map(map)
            .into_rust()
            .map_err(|e| malformed(format!("{name}: {e}")))?;

        let job = build_job(&name, raw)?;
        debug!("Config {name}: {job}");
        jobs.push((name, job));
    }

    if jobs.is_empty() {
        return Err(malformed(format!("no {ENTRY_PREFIX}* entries found")));
    }

    Ok(jobs)
}

fn build_job(name: &str, raw: RawJob) -> Result<JobDescriptor, ConfigError> {
    let job = JobDescriptor::new(fix_path!(raw.source_dir), fix_path!(raw.dest_dir)).map_err(
        |e| ConfigError::Incomplete {
            entry: name.to_string(),
            key: e.key,
        },
    )?;

    Ok(job
        .with_enabled(raw.enabled)
        .with_include(raw.include)
        .with_exclude(raw.exclude)
        .with_options(raw.options, raw.options_mode))
}
