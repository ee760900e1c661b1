//! Images kept in GitHub repositories.
//!
//! Source ids are `acct/repo/path/to/image.jpg`. Descriptive properties live
//! next to the images in YAML side-cars: `image.yaml` for the asset itself and
//! `iiif-props.yaml` in any ancestor directory up to the repository root.
//! Every side-car is fetched concurrently; closer files override farther
//! ones, except `depicts`, which accumulates.

use async_trait::async_trait;
use chrono::Duration;
use futures::future::join_all;
use presenter_core::{rights_url, Agent, Error, ManifestDescriptor, ResourceRef, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{HandlerContext, ManifestBuild, SourceHandler, DEPICTS};
use crate::http::{fetch_json, require_json};
use crate::memo::{MemoCache, DEFAULT_MAX_LEN, DEFAULT_TTL_SECS};

pub const TAG: &str = "gh";

const PROPS_FILE: &str = "iiif-props.yaml";
const DEFAULT_RIGHTS: &str = "CC BY";

/// Hosts whose images count as the repository owner's own content.
const SELF_HOSTED_HOSTS: &[&str] = &["stor.artstor.org"];

// ---------------------------------------------------------------------------
// GitHub API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
    owner: RepoOwner,
}

#[derive(Debug, Deserialize)]
struct RepoOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    login: String,
    #[serde(default)]
    name: Option<String>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatementProp {
    Text(String),
    Pair { label: String, value: String },
}

// ---------------------------------------------------------------------------
// Source id helpers
// ---------------------------------------------------------------------------

/// `acct/repo/path...` split into account, repository and path elements.
fn split_sourceid(sourceid: &str) -> Result<(&str, &str, Vec<&str>)> {
    let mut elems = sourceid.split('/').filter(|e| !e.is_empty());
    match (elems.next(), elems.next()) {
        (Some(acct), Some(repo)) => Ok((acct, repo, elems.collect())),
        _ => Err(Error::Validation(format!("not a github source id: {}", sourceid))),
    }
}

/// Side-car locations for an image path, asset first, repository root last.
fn props_paths(path: &[&str]) -> Vec<String> {
    let joined = path.join("/");
    let stem = joined.split('.').next().unwrap_or_default();
    let mut paths = vec![format!("/{}.yaml", stem)];
    for depth in (0..path.len()).rev() {
        let dir = &path[..depth];
        if dir.is_empty() {
            paths.push(format!("/{}", PROPS_FILE));
        } else {
            paths.push(format!("/{}/{}", dir.join("/"), PROPS_FILE));
        }
    }
    paths
}

/// Label derived from a file name: `harbor_at_dusk-CC-BY.jpg` -> `harbor at dusk`.
fn label_from_filename(name: &str) -> String {
    let stem = name.split('-').next().unwrap_or_default();
    let stem = stem.split("__").next().unwrap_or_default();
    let stem = stem.split('.').next().unwrap_or_default();
    stem.replace('_', " ")
}

/// Rights code spelled in the file name after the first `-`.
fn filename_rights(name: &str) -> Option<String> {
    let (_, suffix) = name.split_once('-')?;
    let code = suffix.split('.').next()?;
    rights_for_code(code)
}

/// Rights URI for a side-car or file-name code (`CC-BY-SA`, `InC-EDU`, `CC0`).
fn rights_for_code(code: &str) -> Option<String> {
    let code = match code.strip_prefix("CC-") {
        Some(rest) => format!("CC {}", rest),
        None => code.to_string(),
    };
    rights_url(&code, None)
}

// ---------------------------------------------------------------------------
// Side-car merge
// ---------------------------------------------------------------------------

/// Merged side-car properties.
#[derive(Debug, Default)]
struct MergedProps {
    values: Map<String, Value>,
    depicts: Vec<String>,
    rights_defined_for_image: bool,
    statement_defined_for_image: bool,
}

impl MergedProps {
    fn str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}

/// Merge side-car levels, `levels[0]` being the asset's own file.
fn merge_props(levels: &[Map<String, Value>]) -> MergedProps {
    let mut merged = MergedProps::default();
    for level in levels.iter().rev() {
        for (key, value) in level {
            match key.as_str() {
                "depicts" => {
                    let mut ids: Vec<String> = Vec::new();
                    for id in value_strings(value) {
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                    merged.depicts.retain(|id| !ids.contains(id));
                    ids.append(&mut merged.depicts);
                    merged.depicts = ids;
                }
                "navDate" => {
                    let date = value_strings(value).join(" ");
                    merged.values.insert(key.clone(), Value::String(date));
                }
                _ => {
                    merged.values.insert(key.clone(), value.clone());
                }
            }
        }
    }
    if let Some(asset) = levels.first() {
        merged.rights_defined_for_image = asset.contains_key("rights");
        merged.statement_defined_for_image = asset.contains_key("requiredStatement");
    }
    merged
}

/// Flatten a YAML value into metadata strings.
fn value_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(value_strings).collect(),
        Value::Bool(_) | Value::Number(_) => vec![value.to_string()],
        Value::Object(_) => vec![value.to_string()],
    }
}

fn resource_refs(value: &Value, kind: &str, language: &str) -> Option<Vec<ResourceRef>> {
    match value {
        Value::String(url) if kind == "Text" => Some(vec![ResourceRef::text(url, language, url)]),
        Value::String(url) => Some(vec![ResourceRef::image(url)]),
        Value::Array(_) => serde_json::from_value(value.clone()).ok(),
        Value::Object(_) => serde_json::from_value(value.clone()).ok().map(|r| vec![r]),
        _ => None,
    }
}

fn agents(value: &Value) -> Option<Vec<Agent>> {
    match value {
        Value::Array(_) => serde_json::from_value(value.clone()).ok(),
        Value::Object(_) => serde_json::from_value(value.clone()).ok().map(|a| vec![a]),
        _ => None,
    }
}

/// Apply recognized side-car keys; anything unrecognized becomes metadata.
async fn apply_props(ctx: &HandlerContext, descriptor: &mut ManifestDescriptor, props: &MergedProps) {
    let lang = ctx.language.as_str();
    for (key, value) in &props.values {
        let applied = match key.as_str() {
            // handled by the caller
            "label" | "image_url" | "service" => true,
            "summary" => value.as_str().map(|s| descriptor.set_summary(lang, s)).is_some(),
            "navDate" => value.as_str().map(|s| descriptor.set_nav_date(s)).is_some(),
            "rights" => match value.as_str() {
                Some(code) => {
                    let rights = rights_for_code(code).unwrap_or_else(|| code.to_string());
                    descriptor.set_rights(rights);
                    true
                }
                None => false,
            },
            "requiredStatement" => match serde_json::from_value::<StatementProp>(value.clone()) {
                Ok(StatementProp::Text(text)) => {
                    descriptor.set_required_statement(lang, "attribution", &text);
                    true
                }
                Ok(StatementProp::Pair { label, value }) => {
                    descriptor.set_required_statement(lang, &label, &value);
                    true
                }
                Err(_) => false,
            },
            "thumbnail" => resource_refs(value, "Image", lang)
                .map(|refs| descriptor.set_thumbnail_refs(refs))
                .is_some(),
            "homepage" => resource_refs(value, "Text", lang)
                .map(|refs| descriptor.set_homepage(refs))
                .is_some(),
            "provider" => agents(value).map(|a| descriptor.set_provider(a)).is_some(),
            _ => false,
        };
        if !applied {
            debug!(key = %key, "Side-car key recorded as metadata");
            ctx.add_metadata(descriptor, key, value_strings(value)).await;
        }
    }
    if !props.depicts.is_empty() {
        ctx.add_metadata(descriptor, DEPICTS, props.depicts.clone()).await;
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

pub struct GithubHandler {
    /// Extension-less source ids resolved against directory listings.
    resolved: MemoCache<String, String>,
}

impl Default for GithubHandler {
    fn default() -> Self {
        Self {
            resolved: MemoCache::new(DEFAULT_MAX_LEN, Duration::seconds(DEFAULT_TTL_SECS)),
        }
    }
}

impl GithubHandler {
    async fn repo_info(&self, ctx: &HandlerContext, acct: &str, repo: &str) -> Result<RepoInfo> {
        let url = format!("{}/repos/{}/{}", ctx.providers.github_api.trim_end_matches('/'), acct, repo);
        debug!(url = %url, "Fetching GitHub repository");
        require_json(self.api_request(ctx, &url), TAG).await
    }

    async fn user_info(&self, ctx: &HandlerContext, login: &str) -> Option<UserInfo> {
        let url = format!("{}/users/{}", ctx.providers.github_api.trim_end_matches('/'), login);
        match fetch_json(self.api_request(ctx, &url), TAG).await {
            Ok(user) => user,
            Err(e) => {
                warn!(login = %login, error = %e, "GitHub user lookup failed");
                None
            }
        }
    }

    fn api_request(&self, ctx: &HandlerContext, url: &str) -> reqwest::RequestBuilder {
        let request = ctx
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        match &ctx.providers.github_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Raw file contents, `None` when missing or unreachable.
    async fn raw_file(&self, ctx: &HandlerContext, acct: &str, repo: &str, git_ref: &str, path: &str) -> Option<String> {
        let url = format!(
            "{}/{}/{}/{}{}",
            ctx.providers.github_raw.trim_end_matches('/'),
            acct,
            repo,
            git_ref,
            path
        );
        let resp = match ctx.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                debug!(url = %url, status = resp.status().as_u16(), "No side-car");
                return None;
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Side-car fetch failed");
                return None;
            }
        };
        resp.text().await.ok()
    }

    /// Fetch every side-car for `path` concurrently, asset first.
    async fn side_cars(
        &self,
        ctx: &HandlerContext,
        acct: &str,
        repo: &str,
        git_ref: &str,
        path: &[&str],
    ) -> Vec<Map<String, Value>> {
        let paths = props_paths(path);
        let fetches = paths
            .iter()
            .map(|p| self.raw_file(ctx, acct, repo, git_ref, p));
        join_all(fetches)
            .await
            .into_iter()
            .zip(&paths)
            .map(|(text, p)| match text {
                Some(text) => match serde_yaml::from_str::<Value>(&text) {
                    Ok(Value::Object(map)) => map,
                    Ok(_) => Map::new(),
                    Err(e) => {
                        warn!(path = %p, error = %e, "Unparseable side-car");
                        Map::new()
                    }
                },
                None => Map::new(),
            })
            .collect()
    }

    /// True when `image_url` lives in the same repository (or an owned host).
    fn is_self_hosted(&self, ctx: &HandlerContext, acct: &str, repo: &str, image_url: &str) -> bool {
        let host = image_url.split('/').nth(2).unwrap_or_default();
        if SELF_HOSTED_HOSTS.contains(&host) {
            return true;
        }
        let raw = ctx.providers.github_raw.trim_end_matches('/');
        [raw, "https://raw.githubusercontent.com", "https://github.com"]
            .iter()
            .any(|base| image_url.starts_with(&format!("{}/{}/{}/", base, acct, repo)))
    }
}

#[async_trait]
impl SourceHandler for GithubHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    async fn can_handle(&self, _ctx: &HandlerContext, url: &str) -> bool {
        url.starts_with("https://github.com") || url.starts_with("https://raw.githubusercontent.com")
    }

    /// Drops the `blob/{ref}` of page URLs and the `{ref}` of raw URLs.
    fn sourceid_from_url(&self, url: &str) -> Option<String> {
        let path: Vec<&str> = url
            .split('?')
            .next()
            .unwrap_or_default()
            .split('/')
            .filter(|e| !e.is_empty())
            .skip(2)
            .collect();
        if path.len() < 2 {
            return None;
        }
        let skip = if url.contains("raw.githubusercontent.com") { 1 } else { 2 };
        let mut elems = path[..2].to_vec();
        elems.extend(path.iter().skip(2 + skip));
        Some(elems.join("/"))
    }

    /// Resolve an extension-less file name against its directory listing.
    async fn normalize_sourceid(&self, ctx: &HandlerContext, sourceid: &str) -> String {
        let Ok((acct, repo, path)) = split_sourceid(sourceid) else {
            return sourceid.to_string();
        };
        let Some((name, dir)) = path.split_last() else {
            return sourceid.to_string();
        };
        if name.contains('.') {
            return sourceid.to_string();
        }
        if let Some(resolved) = self.resolved.get(&sourceid.to_string()) {
            return resolved;
        }
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            ctx.providers.github_api.trim_end_matches('/'),
            acct,
            repo,
            dir.join("/")
        );
        let listing: Vec<ContentEntry> = match fetch_json(self.api_request(ctx, &url), TAG).await {
            Ok(Some(listing)) => listing,
            Ok(None) => return sourceid.to_string(),
            Err(e) => {
                warn!(url = %url, error = %e, "GitHub directory listing failed");
                return sourceid.to_string();
            }
        };
        let resolved = listing
            .iter()
            .filter_map(|entry| entry.name.split_once('.'))
            .find(|(stem, _)| stem == name)
            .map(|(_, ext)| format!("{}.{}", sourceid, ext))
            .unwrap_or_else(|| sourceid.to_string());
        debug!(sourceid = %sourceid, resolved = %resolved, "Resolved extension from listing");
        self.resolved.insert(sourceid.to_string(), resolved.clone());
        resolved
    }

    async fn init_manifest(&self, ctx: &HandlerContext, build: &mut ManifestBuild) -> Result<()> {
        let sourceid = build.sourceid.clone();
        let (acct, repo, path) = split_sourceid(&sourceid)?;
        let repo_info = self.repo_info(ctx, acct, repo).await?;
        let git_ref = repo_info.default_branch.as_str();
        let (user, levels) = tokio::join!(
            self.user_info(ctx, &repo_info.owner.login),
            self.side_cars(ctx, acct, repo, git_ref, &path)
        );
        let props = merge_props(&levels);
        let lang = ctx.language.as_str();
        let file_name = path.last().copied().unwrap_or_default();

        let image_url = props.str("image_url").map(str::to_string).unwrap_or_else(|| {
            format!(
                "{}/{}/{}/{}/{}",
                ctx.providers.github_raw.trim_end_matches('/'),
                acct,
                repo,
                git_ref,
                path.join("/")
            )
        });

        let descriptor = &mut build.descriptor;
        let media = ctx.probe.probe(&image_url).await;
        if let Some(format) = &media.format {
            descriptor.set_format(format);
        }
        descriptor.set_width(media.width.unwrap_or(0));
        descriptor.set_height(media.height.unwrap_or(0));
        descriptor.set_image_url(lang, &image_url);
        descriptor.set_source_url(
            lang,
            &format!("https://github.com/{}/{}/blob/{}/{}", acct, repo, git_ref, path.join("/")),
        );
        if let Some(size) = media.size {
            ctx.add_metadata(descriptor, "size", vec![size.to_string()]).await;
        }

        apply_props(ctx, descriptor, &props).await;
        let label = props
            .str("label")
            .map(str::to_string)
            .unwrap_or_else(|| label_from_filename(file_name));
        descriptor.set_label(lang, &label);

        if let Some(rights) = filename_rights(file_name) {
            descriptor.set_rights(rights);
        }
        if descriptor.rights().is_none() {
            if let Some(rights) = rights_url(DEFAULT_RIGHTS, None) {
                descriptor.set_rights(rights);
            }
        }

        if self.is_self_hosted(ctx, acct, repo, &image_url) {
            if descriptor.is_attribution_required() && !descriptor.has_attribution_statement() {
                match &user {
                    Some(user) => {
                        let name = user.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&user.login);
                        let owner = format!(r#"<a href="{}">{}</a>"#, user.html_url, name);
                        descriptor.set_required_statement(
                            lang,
                            "attribution",
                            &format!(
                                r#"Content provided by {} under <a href="https://creativecommons.org/licenses/by/4.0/">CC BY</a> license"#,
                                owner
                            ),
                        );
                    }
                    None => warn!(sourceid = %sourceid, "No owner info for attribution"),
                }
            }
        } else {
            info!(image_url = %image_url, "Externally hosted image in GitHub manifest");
            if !props.rights_defined_for_image {
                if let Some(rights) = rights_url("UND", None) {
                    descriptor.set_rights(rights);
                }
            }
            if !props.statement_defined_for_image {
                descriptor.set_required_statement(
                    lang,
                    "attribution",
                    &format!("Content obtained from {}", image_url),
                );
            }
            descriptor.set_provider(Vec::new());
        }
        Ok(())
    }
}
