//! Wikidata and Wikimedia Commons lookups.
//!
//! Entity documents, batch label resolution over SPARQL, and the related-entity
//! index keyed by image-URL hash. Every lookup is memoized and every failure is
//! logged and swallowed: an entity we cannot reach is just an entity we do not
//! know about.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use presenter_core::MetadataEntry;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::ProvidersConfig;
use crate::http::{fetch_json, require_json};
use crate::memo::{MemoCache, DEFAULT_MAX_LEN, DEFAULT_TTL_SECS};

/// Labels are stable; keep many and keep them long.
const LABEL_CACHE_LEN: usize = 10_000;
const LABEL_CACHE_TTL_HOURS: i64 = 24;

/// Wikidata property ids read by the handlers.
pub mod props {
    pub const DEPICTS: &str = "P180";
    pub const IMAGE: &str = "P18";
    pub const IIIF_MANIFEST: &str = "P6108";
    pub const DIGITAL_REPRESENTATION_OF: &str = "P6243";
    pub const MAIN_SUBJECT: &str = "P921";
}

/// True for bare Wikidata item ids like `Q42`.
pub fn is_qid(value: &str) -> bool {
    value.len() > 1
        && value.starts_with('Q')
        && value[1..].chars().all(|c| c.is_ascii_digit())
}

/// Hyperlink for an entity.
pub fn qid_link(qid: &str, label: &str) -> String {
    format!(r#"<a href="https://www.wikidata.org/wiki/{}">{}</a>"#, qid, label)
}

/// Q-id at the end of a Wikidata URL, e.g. `https://www.wikidata.org/wiki/Q42`.
pub fn qid_from_url(url: &str) -> Option<String> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| is_qid(s))
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Statement access
// ---------------------------------------------------------------------------

fn statements(entity: &Value) -> Option<&serde_json::Map<String, Value>> {
    entity
        .get("statements")
        .or_else(|| entity.get("claims"))
        .and_then(Value::as_object)
}

fn claims<'a>(entity: &'a Value, prop: &str) -> &'a [Value] {
    statements(entity)
        .and_then(|s| s.get(prop))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Entity ids referenced by `prop`, preferred rank first.
pub fn entity_claims(entity: &Value, prop: &str) -> Vec<String> {
    let mut ids: Vec<(bool, String)> = claims(entity, prop)
        .iter()
        .filter_map(|stmt| {
            let id = stmt.pointer("/mainsnak/datavalue/value/id")?.as_str()?;
            let preferred = stmt.get("rank").and_then(Value::as_str) == Some("preferred");
            Some((preferred, id.to_string()))
        })
        .collect();
    // stable sort keeps source order within each rank
    ids.sort_by_key(|(preferred, _)| !*preferred);
    ids.into_iter().map(|(_, id)| id).collect()
}

/// First string value of `prop` (commonsMedia, url and string datatypes).
pub fn string_claim(entity: &Value, prop: &str) -> Option<String> {
    claims(entity, prop)
        .iter()
        .find_map(|stmt| stmt.pointer("/mainsnak/datavalue/value")?.as_str().map(str::to_string))
}

/// `P180` values, preferred first.
pub fn depicts(entity: &Value) -> Vec<String> {
    entity_claims(entity, props::DEPICTS)
}

/// First `P6243` or `P921` value.
pub fn digital_representation_of(entity: &Value) -> Option<String> {
    [props::DIGITAL_REPRESENTATION_OF, props::MAIN_SUBJECT]
        .iter()
        .find_map(|prop| entity_claims(entity, prop).into_iter().next())
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<SparqlBinding>,
}

#[derive(Debug, Deserialize)]
struct SparqlBinding {
    item: SparqlValue,
    label: SparqlValue,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
    #[serde(rename = "xml:lang", default)]
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntityDocument {
    entities: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CommonsQueryResponse {
    query: CommonsQuery,
}

#[derive(Debug, Deserialize)]
struct CommonsQuery {
    pages: HashMap<String, CommonsPage>,
}

/// One file page from the Commons `imageinfo` query.
#[derive(Debug, Clone, Deserialize)]
pub struct CommonsPage {
    #[serde(default)]
    pub pageid: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub imageinfo: Vec<CommonsImageInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommonsImageInfo {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub extmetadata: HashMap<String, ExtMetadataValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtMetadataValue {
    pub value: Value,
}

impl CommonsImageInfo {
    /// An `extmetadata` value as text.
    pub fn ext(&self, key: &str) -> Option<String> {
        match &self.extmetadata.get(key)?.value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// An entity related to an image through the related-entity index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedEntity {
    pub id: String,
    pub prominent: bool,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct EntityService {
    client: reqwest::Client,
    providers: Arc<ProvidersConfig>,
    labels: MemoCache<(String, String), String>,
    wikidata: MemoCache<String, Value>,
    commons: MemoCache<u64, Value>,
}

impl EntityService {
    pub fn new(client: reqwest::Client, providers: Arc<ProvidersConfig>, clock: Arc<dyn Clock>) -> Self {
        let ttl = Duration::seconds(DEFAULT_TTL_SECS);
        Self {
            client,
            providers,
            labels: MemoCache::with_clock(
                LABEL_CACHE_LEN,
                Duration::hours(LABEL_CACHE_TTL_HOURS),
                clock.clone(),
            ),
            wikidata: MemoCache::with_clock(DEFAULT_MAX_LEN, ttl, clock.clone()),
            commons: MemoCache::with_clock(DEFAULT_MAX_LEN, ttl, clock),
        }
    }

    /// Labels for `qids` in `language` (falling back to English).
    ///
    /// Only ids missing from the memo are queried, in one SPARQL request.
    pub async fn labels(&self, qids: &[String], language: &str) -> HashMap<String, String> {
        let mut found = HashMap::new();
        let mut needed = Vec::new();
        for qid in qids {
            match self.labels.get(&(qid.clone(), language.to_string())) {
                Some(label) => {
                    found.insert(qid.clone(), label);
                }
                None if !needed.contains(qid) => needed.push(qid.clone()),
                None => {}
            }
        }
        if needed.is_empty() {
            return found;
        }

        match self.query_labels(&needed, language).await {
            Ok(fetched) => {
                for (qid, label) in fetched {
                    self.labels.insert((qid.clone(), language.to_string()), label.clone());
                    found.insert(qid, label);
                }
            }
            Err(e) => warn!(error = %e, count = needed.len(), "Entity label lookup failed"),
        }
        found
    }

    async fn query_labels(
        &self,
        qids: &[String],
        language: &str,
    ) -> presenter_core::Result<Vec<(String, String)>> {
        let values = qids
            .iter()
            .map(|qid| format!("(<http://www.wikidata.org/entity/{}>)", qid))
            .collect::<Vec<_>>()
            .join(" ");
        let query = format!(
            r#"SELECT ?item ?label WHERE {{ VALUES (?item) {{ {} }} ?item rdfs:label ?label . FILTER (LANG(?label) = "{}" || LANG(?label) = "en") .}}"#,
            values, language
        );
        debug!(count = qids.len(), "SPARQL label query");

        let resp: SparqlResponse = require_json(
            self.client
                .get(&self.providers.wikidata_sparql)
                .query(&[("query", query.as_str())])
                .header("Accept", "application/sparql-results+json"),
            "wikidata-sparql",
        )
        .await?;

        // requested language wins over the English fallback
        let mut labels: HashMap<String, String> = HashMap::new();
        for binding in resp.results.bindings {
            let qid = binding
                .item
                .value
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            if binding.label.lang.as_deref() == Some(language) {
                labels.insert(qid, binding.label.value);
            } else {
                labels.entry(qid).or_insert(binding.label.value);
            }
        }
        Ok(labels.into_iter().collect())
    }

    /// Render every Q-id value in `entry` as a labelled hyperlink.
    pub async fn link_qids(&self, entry: &mut MetadataEntry, language: &str) {
        let languages: Vec<String> = entry.value.languages().map(str::to_string).collect();
        let qids: Vec<String> = languages
            .iter()
            .flat_map(|lang| entry.value.values(lang).to_vec())
            .filter(|v| is_qid(v))
            .collect();
        if qids.is_empty() {
            return;
        }
        let labels = self.labels(&qids, language).await;

        let mut linked = presenter_core::LanguageMap::default();
        for lang in &languages {
            let values = entry
                .value
                .values(lang)
                .iter()
                .map(|v| {
                    if is_qid(v) {
                        qid_link(v, labels.get(v).map(String::as_str).unwrap_or(v))
                    } else {
                        v.clone()
                    }
                })
                .collect::<Vec<_>>();
            linked.merge_union(&presenter_core::LanguageMap::new(lang, values));
        }
        entry.value = linked;
    }

    /// Wikidata entity document for `qid`.
    pub async fn wikidata_entity(&self, qid: &str) -> Option<Value> {
        if let Some(entity) = self.wikidata.get(&qid.to_string()) {
            return Some(entity);
        }
        let url = format!(
            "{}/wiki/Special:EntityData/{}.json",
            self.providers.wikidata_api.trim_end_matches('/'),
            qid
        );
        debug!(url = %url, "Fetching Wikidata entity");
        let entity = self.entity_from(&url, qid, "wikidata").await?;
        self.wikidata.insert(qid.to_string(), entity.clone());
        Some(entity)
    }

    /// Structured-data entity (`M{pageid}`) for a Commons file.
    pub async fn commons_entity(&self, pageid: u64) -> Option<Value> {
        if let Some(entity) = self.commons.get(&pageid) {
            return Some(entity);
        }
        let mid = format!("M{}", pageid);
        let url = format!(
            "{}/wiki/Special:EntityData/{}.json",
            self.providers.commons_api.trim_end_matches('/'),
            mid
        );
        debug!(url = %url, "Fetching Commons entity");
        let entity = self.entity_from(&url, &mid, "commons").await?;
        self.commons.insert(pageid, entity.clone());
        Some(entity)
    }

    async fn entity_from(&self, url: &str, id: &str, provider: &str) -> Option<Value> {
        match fetch_json::<EntityDocument>(self.client.get(url), provider).await {
            Ok(Some(mut doc)) => doc.entities.remove(id),
            Ok(None) => None,
            Err(e) => {
                warn!(id = %id, error = %e, "Entity lookup failed");
                None
            }
        }
    }

    /// `imageinfo` page for a Commons file title (without the `File:` prefix).
    pub async fn commons_file(&self, title: &str) -> Option<CommonsPage> {
        let url = format!("{}/w/api.php", self.providers.commons_api.trim_end_matches('/'));
        let file = format!("File:{}", title);
        let request = self.client.get(&url).query(&[
            ("format", "json"),
            ("action", "query"),
            ("titles", file.as_str()),
            ("prop", "imageinfo"),
            ("iiprop", "extmetadata|size|mime"),
        ]);
        debug!(url = %url, title = %title, "Fetching Commons imageinfo");
        match fetch_json::<CommonsQueryResponse>(request, "commons").await {
            Ok(Some(resp)) => resp.query.pages.into_values().next(),
            Ok(None) => None,
            Err(e) => {
                warn!(title = %title, error = %e, "Commons imageinfo lookup failed");
                None
            }
        }
    }

    /// Entities linked to an image in the related-entity index, by property.
    pub async fn related_entities(&self, image_url: &str) -> HashMap<String, Vec<RelatedEntity>> {
        let hash = hex::encode(Sha256::digest(image_url.as_bytes()));
        let body = json!({
            "query": {"query_string": {"query": format!("_id:\"{}\"", hash)}},
            "size": 100
        });
        let request = self
            .client
            .post(&self.providers.related_entities_url)
            .header("Accept", "application/json")
            .json(&body);

        let results: Value = match fetch_json(request, "related-entities").await {
            Ok(Some(v)) => v,
            Ok(None) => return HashMap::new(),
            Err(e) => {
                debug!(error = %e, "Related-entity lookup failed");
                return HashMap::new();
            }
        };
        parse_related(&results)
    }
}

fn parse_related(results: &Value) -> HashMap<String, Vec<RelatedEntity>> {
    let mut related: HashMap<String, Vec<RelatedEntity>> = HashMap::new();
    let hits = results
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    for hit in hits {
        let Some(statements) = hit.pointer("/_source/statements").and_then(Value::as_object) else {
            continue;
        };
        for (prop, stmts) in statements {
            let Some(stmts) = stmts.as_array() else { continue };
            let is_entity = stmts
                .first()
                .and_then(|s| s.pointer("/mainsnak/datavalue/type"))
                .and_then(Value::as_str)
                == Some("wikibase-entityid");
            if !is_entity {
                continue;
            }
            let entities = stmts
                .iter()
                .filter_map(|stmt| {
                    let id = stmt.pointer("/mainsnak/datavalue/value/id")?;
                    Some(RelatedEntity {
                        id: id.get("value")?.as_str()?.to_string(),
                        prominent: id.get("rank").and_then(Value::as_str) == Some("preferred"),
                    })
                })
                .collect();
            related.insert(prop.clone(), entities);
        }
    }
    related
}
