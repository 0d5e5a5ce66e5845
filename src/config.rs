use anyhow::{Context, Result, anyhow};
use directories::UserDirs;
use log::{info, warn};
use serde::{Deserialize, Deserializer};
use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use crate::classifier::{Classifier, Recognizer};
use crate::controls::{GestureBindings, Input};
use crate::entity::HeroSettings;
use crate::gestures::{BUILTIN_REGISTRIES, Registry, TemplateLibrary, Tuning};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    pub threshold: f32,
    pub registries: Vec<String>,
    pub capture_timeout_ms: u64,
    /// Pacing of replayed recordings.
    pub frame_interval_ms: u64,
    pub templates: Option<PathBuf>,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            registries: BUILTIN_REGISTRIES.iter().map(|s| s.to_string()).collect(),
            capture_timeout_ms: 100,
            frame_interval_ms: 33,
            templates: None,
        }
    }
}

impl RecognitionSettings {
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub fps: u32,
    pub hero_speed: f32,
    pub jump_speed: f32,
    pub spell_cooldown_ms: u64,
    pub hero_hp: i32,
}

impl Default for GameSettings {
    fn default() -> Self {
        let hero = HeroSettings::default();
        Self {
            fps: 60,
            hero_speed: hero.speed,
            jump_speed: hero.jump_speed,
            spell_cooldown_ms: hero.spell_cooldown_ms,
            hero_hp: hero.hp,
        }
    }
}

impl GameSettings {
    pub fn hero(&self) -> HeroSettings {
        HeroSettings {
            speed: self.hero_speed,
            jump_speed: self.jump_speed,
            spell_cooldown_ms: self.spell_cooldown_ms,
            hp: self.hero_hp,
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub recognition: RecognitionSettings,
    #[serde(default)]
    pub tuning: Tuning,
    #[serde(default)]
    pub game: GameSettings,

    #[serde(default, deserialize_with = "deserialize_bindings")]
    pub bindings: HashMap<String, String>,
}

impl Profile {
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let profile: Profile =
            toml::from_str(text).with_context(|| format!("failed to parse {origin}"))?;
        validate_profile(&profile).with_context(|| format!("invalid profile {origin}"))?;
        Ok(profile)
    }

    pub fn bundled_default() -> Result<Self> {
        Self::parse(default_profile_text(), "bundled default profile")
    }

    /// One classifier per configured registry, then one for recorded templates.
    pub fn recognizer(&self, templates: Option<&TemplateLibrary>) -> Result<Recognizer> {
        let r = &self.recognition;
        let classifier = |registry: Registry| {
            Classifier::new(Arc::new(registry), r.threshold, self.tuning.clone())
        };
        let mut recognizer = Recognizer::new();
        for name in &r.registries {
            let registry =
                Registry::builtin(name).ok_or_else(|| anyhow!("unknown registry '{name}'"))?;
            recognizer.push(name.as_str(), classifier(registry));
        }
        if let Some(lib) = templates.filter(|lib| !lib.is_empty()) {
            recognizer.push("templates", classifier(lib.registry()));
        }
        Ok(recognizer)
    }

    pub fn gesture_bindings(&self) -> Result<GestureBindings> {
        Ok(GestureBindings::with_overrides(&self.bindings)?)
    }
}

/// Gesture name to input token; nested tables are rejected since gesture names are flat.
fn deserialize_bindings<'de, D>(de: D) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let table = match toml::Value::deserialize(de)? {
        toml::Value::Table(t) => t,
        other => {
            return Err(serde::de::Error::custom(format!(
                "bindings must be a table, got {}",
                other.type_str()
            )));
        }
    };

    let mut out = HashMap::new();
    for (gesture, v) in table {
        match v {
            toml::Value::String(token) => {
                out.insert(gesture, token);
            }
            other => {
                return Err(serde::de::Error::custom(format!(
                    "binding '{gesture}' must be an input token string, got {}",
                    other.type_str()
                )));
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct ConfigState {
    pub active_name: String,
    pub profile: Profile,
    pub config_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

pub fn default_config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("flowheroes"))
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

impl ConfigState {
    pub fn load_or_install_default() -> Result<Self> {
        Self::open(default_config_dir()?)
    }

    /// Same as [`ConfigState::load_or_install_default`] rooted at `config_dir`.
    pub fn open(config_dir: PathBuf) -> Result<Self> {
        let profiles_dir = config_dir.join("profiles");
        fs::create_dir_all(&profiles_dir)
            .with_context(|| format!("failed to create {}", profiles_dir.display()))?;

        let def_path = profiles_dir.join("default.toml");
        if !def_path.exists() {
            fs::write(&def_path, default_profile_text())?;
            info!("installed default profile at {}", def_path.display());
        }

        let active_ptr = config_dir.join("active");
        if !active_ptr.exists() {
            let mut f = fs::File::create(&active_ptr)?;
            f.write_all(b"default")?;
        }

        let active_name = fs::read_to_string(&active_ptr)?.trim().to_string();
        let profile = load_profile(&profiles_dir, &active_name)?;

        Ok(Self {
            active_name,
            profile,
            config_dir,
            profiles_dir,
            active_ptr,
        })
    }

    /// Re-reads the active profile; the last good one stays on error.
    pub fn reload(&mut self) -> Result<()> {
        self.profile = load_profile(&self.profiles_dir, &self.active_name)?;
        Ok(())
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let p = self.profiles_dir.join(format!("{name}.toml"));
        if !p.exists() {
            return Err(anyhow!("profile not found: {}", p.display()));
        }
        let profile = load_profile(&self.profiles_dir, name)?;
        fs::write(&self.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        self.profile = profile;
        info!("active profile is now '{name}'");
        Ok(())
    }

    /// Loads another profile without touching the active pointer.
    pub fn profile_named(&self, name: &str) -> Result<Profile> {
        load_profile(&self.profiles_dir, name)
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let path = e.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }

    pub fn templates_path(&self, profile: &Profile) -> PathBuf {
        profile
            .recognition
            .templates
            .clone()
            .unwrap_or_else(|| self.config_dir.join("templates.json"))
    }

    /// Recorded templates for `profile`; a broken library is logged and skipped.
    pub fn templates(&self, profile: &Profile) -> Option<TemplateLibrary> {
        let path = self.templates_path(profile);
        if !path.exists() {
            return None;
        }
        match TemplateLibrary::load(&path) {
            Ok(lib) => Some(lib),
            Err(e) => {
                warn!("ignoring templates: {e:#}");
                None
            }
        }
    }

    pub fn doctor_report(&self) -> serde_json::Value {
        let templates_path = self.templates_path(&self.profile);
        let templates = self.templates(&self.profile);
        let gestures: Option<serde_json::Map<String, serde_json::Value>> = self
            .profile
            .recognizer(templates.as_ref())
            .ok()
            .map(|r| {
                r.stages()
                    .map(|(name, c)| (name.to_string(), serde_json::json!(c.registry().names())))
                    .collect()
            });
        serde_json::json!({
            "config_dir": self.config_dir,
            "profiles_dir": self.profiles_dir,
            "profiles": self.list_profiles(),
            "active_profile": self.active_name,
            "profile_name": self.profile.meta.name,
            "threshold": self.profile.recognition.threshold,
            "registries": self.profile.recognition.registries,
            "gestures": gestures,
            "templates": {
                "path": templates_path,
                "present": templates_path.exists(),
                "count": templates.map(|t| t.len()).unwrap_or(0),
            },
            "fps": self.profile.game.fps,
            "hints": {
                "log_level": "RUST_LOG=debug flowheroes run --replay <file>",
                "record": "flowheroes record <name> <recording.jsonl>"
            }
        })
    }
}

fn load_profile(profiles_dir: &Path, name: &str) -> Result<Profile> {
    let path = profiles_dir.join(format!("{name}.toml"));
    let txt = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Profile::parse(&txt, &path.display().to_string())
}

pub fn validate_profile(p: &Profile) -> Result<()> {
    let r = &p.recognition;
    if !(r.threshold > 0.0 && r.threshold <= 1.0) {
        return Err(anyhow!("recognition.threshold must be in (0,1]"));
    }
    if r.capture_timeout_ms == 0 {
        return Err(anyhow!("recognition.capture_timeout_ms must be positive"));
    }
    for name in &r.registries {
        if !BUILTIN_REGISTRIES.contains(&name.as_str()) {
            return Err(anyhow!(
                "unknown registry '{name}' (expected one of {})",
                BUILTIN_REGISTRIES.join(", ")
            ));
        }
    }

    let t = &p.tuning;
    for (key, v) in [
        ("curl_threshold", t.curl_threshold),
        ("extension_threshold", t.extension_threshold),
    ] {
        if !(v > 0.0 && v < 1.0) {
            return Err(anyhow!("tuning.{key} must be in (0,1)"));
        }
    }
    for (key, v) in [
        ("shape_weight", t.shape_weight),
        ("pause_pose_weight", t.pause_pose_weight),
        ("exit_closure_weight", t.exit_closure_weight),
    ] {
        if !(0.0..=1.0).contains(&v) {
            return Err(anyhow!("tuning.{key} must be in [0,1]"));
        }
    }
    if t.circle_range <= 0.0 || t.touch_distance <= 0.0 {
        return Err(anyhow!("tuning distances must be positive"));
    }

    if p.game.fps == 0 {
        return Err(anyhow!("game.fps must be positive"));
    }

    for (k, v) in &p.bindings {
        if k.trim().is_empty() {
            return Err(anyhow!("empty binding key"));
        }
        v.parse::<Input>()
            .map_err(|e| anyhow!("binding '{k}': {e}"))?;
    }
    Ok(())
}
