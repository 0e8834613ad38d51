//! Curation des exemples stockés dans le stockage objet.
//!
//! Le flux « exemples précalculés » lit un dossier de paires
//! `<nom>.wav` / `<nom>.png` et un journal texte des noms déjà traités,
//! puis propose la première paire complète absente du journal.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::example::{split_labeled_name, LABELED_SEPARATOR};
use crate::domain::{
    CandidateName, ExampleClassCount, ExampleType, LabeledOutput, PrecomputedExample,
    SourceGlobCheck,
};
use crate::infrastructure::registry::ProjectRegistry;
use crate::infrastructure::storage::{basename, list_glob, parent_folder, ObjectStore, ObjectUri};
use crate::utils::error::{AppError, Result};

/// Message renvoyé quand tous les exemples ont été traités
pub const NO_MORE_EXAMPLES: &str = "No more examples to label, you're done!";

/// Validité des URLs média de l'exemple à annoter
pub const CANDIDATE_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Validité des URLs média des sorties labellisées
pub const LABELED_URL_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Type de vocalisation qui range un fichier dans `unknown/`
pub const UNKNOWN_VOC_TYPE: &str = "unknown";

const VOC_TYPES: [&str; 3] = ["call", "song", UNKNOWN_VOC_TYPE];

/// Paire audio/spectrogramme partageant un nom de base
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePair {
    pub basename: String,
    pub audio: Option<String>,
    pub spectrogram: Option<String>,
}

impl CandidatePair {
    pub fn is_complete(&self) -> bool {
        self.audio.is_some() && self.spectrogram.is_some()
    }
}

/// Retire les 4 derniers caractères (`.wav`, `.png`)
fn strip_extension(name: &str) -> &str {
    match name.char_indices().rev().nth(3) {
        Some((index, _)) => &name[..index],
        None => "",
    }
}

/// Ligne du journal pour un exemple : le nom de son audio sans extension,
/// la même clé que celle produite par [`group_candidates`]
pub fn log_line(example: &PrecomputedExample) -> Result<String> {
    let audio = ObjectUri::parse(&example.gsuri)?;
    Ok(strip_extension(audio.basename()).to_string())
}

/// Regroupe des clés en paires, dans l'ordre de première apparition
pub fn group_candidates<S: AsRef<str>>(keys: &[S]) -> Vec<CandidatePair> {
    let mut pairs: Vec<CandidatePair> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for key in keys {
        let key = key.as_ref();
        let name = basename(key);
        let is_audio = name.ends_with(".wav");
        if !is_audio && !name.ends_with(".png") {
            continue;
        }
        let stem = strip_extension(name).to_string();
        let slot = *index.entry(stem.clone()).or_insert_with(|| {
            pairs.push(CandidatePair {
                basename: stem,
                ..CandidatePair::default()
            });
            pairs.len() - 1
        });
        if is_audio {
            pairs[slot].audio = Some(key.to_string());
        } else {
            pairs[slot].spectrogram = Some(key.to_string());
        }
    }
    pairs
}

/// Première paire complète dont le nom n'est pas dans `labeled`
pub fn select_next_unlabeled<'a>(
    pairs: &'a [CandidatePair],
    labeled: &HashSet<String>,
) -> Option<&'a CandidatePair> {
    pairs
        .iter()
        .find(|pair| pair.is_complete() && !labeled.contains(&pair.basename))
}

/// Lit le journal des exemples traités (une entrée par ligne, `.wav` final ignoré)
pub fn parse_labeled_log(text: &str) -> HashSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.strip_suffix(".wav").unwrap_or(line).to_string())
        .collect()
}

/// Ajoute une ligne au journal en garantissant un saut de ligne avant elle
pub fn append_log_line(existing: &str, line: &str) -> String {
    let mut content = existing.to_string();
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(line);
    content.push('\n');
    content
}

/// Échappe les métacaractères glob d'un fragment de nom
fn escape_glob(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        match c {
            '*' | '?' | '[' | ']' | '{' | '}' | '\\' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Un segment de chemin choisi par l'utilisateur (classe, type de vocalisation)
fn validate_segment(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() || value.contains('/') || value == "." || value == ".." {
        return Err(AppError::Validation(format!("invalid {}: {:?}", field, value)));
    }
    Ok(())
}

/// L'objet doit se trouver sous l'emplacement `root`
fn ensure_within(uri: &ObjectUri, root: &ObjectUri) -> Result<()> {
    let inside = uri.bucket == root.bucket
        && uri.path.starts_with(&format!("{}/", root.path))
        && !uri.path.split('/').any(|segment| segment == "..");
    if !inside {
        return Err(AppError::Validation(format!(
            "{} is outside of {}",
            uri, root
        )));
    }
    Ok(())
}

pub struct CurationService {
    store: Arc<dyn ObjectStore>,
    registry: Arc<ProjectRegistry>,
}

impl CurationService {
    pub fn new(store: Arc<dyn ObjectStore>, registry: Arc<ProjectRegistry>) -> Self {
        Self { store, registry }
    }

    async fn labeled_set(&self, log: &ObjectUri) -> Result<HashSet<String>> {
        match self.store.read(log).await {
            Ok(bytes) => Ok(parse_labeled_log(&String::from_utf8_lossy(&bytes))),
            Err(AppError::NotFound(_)) => Ok(HashSet::new()),
            Err(e) => Err(e),
        }
    }

    /// Prochain exemple précalculé à annoter, `None` quand il n'en reste plus
    pub async fn next_example(&self, project: &str) -> Result<Option<PrecomputedExample>> {
        let log = self.registry.already_labeled_file(project)?;
        let dir = self
            .registry
            .examples_location(project, ExampleType::SearchResults)?;

        let labeled = self.labeled_set(&log).await?;
        let keys = list_glob(
            self.store.as_ref(),
            &dir.bucket,
            &format!("{}/*", escape_glob(&dir.path)),
        )
        .await?;
        let pairs = group_candidates(&keys);
        debug!(
            "{} paires candidates, {} déjà labellisées",
            pairs.len(),
            labeled.len()
        );

        let pair = match select_next_unlabeled(&pairs, &labeled) {
            Some(pair) => pair,
            None => return Ok(None),
        };
        let (audio, spectrogram) = match (&pair.audio, &pair.spectrogram) {
            (Some(audio), Some(spectrogram)) => (
                ObjectUri::new(dir.bucket.clone(), audio.clone()),
                ObjectUri::new(dir.bucket.clone(), spectrogram.clone()),
            ),
            _ => return Ok(None),
        };

        let name = CandidateName::parse(&pair.basename);
        Ok(Some(PrecomputedExample {
            gsuri: audio.to_string(),
            audio_url: self.store.media_url(&audio, CANDIDATE_URL_TTL).await?,
            spec_url: self.store.media_url(&spectrogram, CANDIDATE_URL_TTL).await?,
            filename: name.filename,
            species: name.species,
            timestamp_s: name.timestamp_s,
        }))
    }

    /// Marque un exemple comme traité (ajout d'une ligne au journal)
    pub async fn finish_example(&self, project: &str, example: &PrecomputedExample) -> Result<()> {
        let log = self.registry.already_labeled_file(project)?;
        let line = log_line(example)?;
        let existing = match self.store.read(&log).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(AppError::NotFound(_)) => String::new(),
            Err(e) => return Err(e),
        };

        self.store
            .write(&log, append_log_line(&existing, &line).into_bytes())
            .await?;
        info!("✅ Exemple {} ajouté à {}", line, log);
        Ok(())
    }

    /// Nombre d'exemples par classe pour un type d'exemples
    pub async fn example_counts(
        &self,
        project: &str,
        example_type: ExampleType,
    ) -> Result<Vec<ExampleClassCount>> {
        let dir = self.registry.examples_location(project, example_type)?;
        let root = escape_glob(&dir.path);
        let pattern = if example_type.is_nested() {
            format!("{}/*/*", root)
        } else {
            format!("{}/*.wav", root)
        };
        let keys = list_glob(self.store.as_ref(), &dir.bucket, &pattern).await?;

        let mut counts: Vec<ExampleClassCount> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for key in &keys {
            let class = if example_type.is_nested() {
                parent_folder(key).unwrap_or_default().to_string()
            } else {
                CandidateName::species_of_file(basename(key))
            };
            match index.get(&class) {
                Some(&i) => counts[i].number += 1,
                None => {
                    index.insert(class.clone(), counts.len());
                    counts.push(ExampleClassCount { class, number: 1 });
                }
            }
        }
        Ok(counts)
    }

    async fn spectrogram_url(
        &self,
        search_dir: &ObjectUri,
        filename: &str,
        timestamp_s: &str,
    ) -> Result<Option<String>> {
        let pattern = format!(
            "{}/*{}*^_^{}.0^_^*.png",
            escape_glob(&search_dir.path),
            escape_glob(filename),
            escape_glob(timestamp_s)
        );
        let matches = list_glob(self.store.as_ref(), &search_dir.bucket, &pattern).await?;
        match matches.first() {
            Some(key) => {
                let uri = ObjectUri::new(search_dir.bucket.clone(), key.clone());
                Ok(Some(self.store.media_url(&uri, LABELED_URL_TTL).await?))
            }
            None => Ok(None),
        }
    }

    /// Sorties rangées dans le dossier d'une classe
    pub async fn examples_for_class(
        &self,
        project: &str,
        example_type: ExampleType,
        example_class: &str,
    ) -> Result<Vec<LabeledOutput>> {
        validate_segment(example_class, "example class")?;
        let dir = self.registry.examples_location(project, example_type)?;
        // Sans dossier de résultats, les spectrogrammes sont simplement absents
        let search_dir = self
            .registry
            .examples_location(project, ExampleType::SearchResults)
            .ok();

        let class_prefix = format!("{}/{}/", dir.path, example_class);
        let keys = self.store.list(&dir.bucket, &class_prefix).await?;

        let mut outputs = Vec::with_capacity(keys.len());
        for key in keys {
            let uri = ObjectUri::new(dir.bucket.clone(), key);
            let (filename, timestamp_s) = split_labeled_name(uri.basename());
            let spec_url = match &search_dir {
                Some(search_dir) => {
                    self.spectrogram_url(search_dir, &filename, &timestamp_s)
                        .await?
                }
                None => None,
            };
            outputs.push(LabeledOutput {
                example_class: example_class.to_string(),
                audio_url: self.store.media_url(&uri, LABELED_URL_TTL).await?,
                gsuri: uri.to_string(),
                filename,
                timestamp_s,
                spec_url,
            });
        }
        Ok(outputs)
    }

    /// Range l'audio d'un exemple dans `<sorties>/<espèce>_<type>/`
    pub async fn annotate_recording(
        &self,
        project: &str,
        example: &PrecomputedExample,
        voc_type: &str,
    ) -> Result<ObjectUri> {
        if !VOC_TYPES.contains(&voc_type) {
            return Err(AppError::Validation(format!(
                "voc_type must be one of {} (got {})",
                VOC_TYPES.join(", "),
                voc_type
            )));
        }
        let source = ObjectUri::parse(&example.gsuri)?;
        let search_dir = self
            .registry
            .examples_location(project, ExampleType::SearchResults)?;
        ensure_within(&source, &search_dir)?;
        let labeled = self
            .registry
            .examples_location(project, ExampleType::LabeledOutputs)?;

        let class = if voc_type == UNKNOWN_VOC_TYPE {
            UNKNOWN_VOC_TYPE.to_string()
        } else {
            validate_segment(&example.species, "species")?;
            format!("{}_{}", example.species, voc_type)
        };
        let file_name = format!(
            "{}{}{}.wav",
            strip_extension(&example.filename),
            LABELED_SEPARATOR,
            example.timestamp_s
        );
        validate_segment(&file_name, "file name")?;

        let target = labeled.join(&format!("{}/{}", class, file_name));
        self.store.rename(&source, &target).await?;
        info!("📁 {} rangé dans {}", source, target);
        Ok(target)
    }

    /// Déplace une sortie labellisée vers une autre classe
    pub async fn move_labeled_output(
        &self,
        project: &str,
        output: &LabeledOutput,
        new_class: &str,
    ) -> Result<ObjectUri> {
        validate_segment(new_class, "example class")?;
        let source = ObjectUri::parse(&output.gsuri)?;
        let labeled = self
            .registry
            .examples_location(project, ExampleType::LabeledOutputs)?;
        ensure_within(&source, &labeled)?;

        let target = labeled.join(&format!("{}/{}", new_class, source.basename()));
        if target == source {
            return Ok(target);
        }
        self.store.rename(&source, &target).await?;
        info!("📁 {} déplacé vers {}", source, target);
        Ok(target)
    }

    async fn list_source_glob(&self, glob: &str) -> Result<Vec<String>> {
        let uri = ObjectUri::parse(glob)?;
        list_glob(self.store.as_ref(), &uri.bucket, &uri.path).await
    }

    /// Liste les fichiers d'un motif `gs://bucket/<glob>` sans jamais échouer
    pub async fn check_source_glob(&self, glob: &str) -> SourceGlobCheck {
        match self.list_source_glob(glob).await {
            Ok(files) => SourceGlobCheck {
                success: true,
                files,
                error: None,
            },
            Err(e) => SourceGlobCheck {
                success: false,
                files: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }

    pub fn default_project(&self, email: &str) -> Result<String> {
        self.registry.default_project(email)
    }
}
