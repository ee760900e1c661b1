//! Wikidata entities, rendered through their `P18` image on Commons.

use async_trait::async_trait;
use presenter_core::{Error, Result};
use tracing::info;

use super::wikimedia_commons::populate_from_commons;
use super::{last_element, HandlerContext, ManifestBuild, SourceHandler, DEPICTS, REPRESENTS};
use crate::entities::{self, props};

pub const TAG: &str = "wd";

#[derive(Debug, Default)]
pub struct WikidataHandler;

#[async_trait]
impl SourceHandler for WikidataHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    async fn can_handle(&self, _ctx: &HandlerContext, url: &str) -> bool {
        url.starts_with("https://www.wikidata.org")
    }

    fn sourceid_from_url(&self, url: &str) -> Option<String> {
        last_element(url)
    }

    async fn init_manifest(&self, ctx: &HandlerContext, build: &mut ManifestBuild) -> Result<()> {
        let qid = build.sourceid.clone();
        let entity = ctx
            .entities
            .wikidata_entity(&qid)
            .await
            .ok_or_else(|| Error::not_found("wikidata entity", &qid))?;

        if let Some(manifest) = entities::string_claim(&entity, props::IIIF_MANIFEST) {
            info!(qid = %qid, manifest = %manifest, "Entity publishes its own manifest");
            build.external_manifest = Some(manifest);
            return Ok(());
        }

        let title = entities::string_claim(&entity, props::IMAGE)
            .map(|t| t.replace(' ', "_"))
            .ok_or_else(|| Error::not_found("wikidata image", &qid))?;
        let file_entity = populate_from_commons(ctx, &mut build.descriptor, &title).await?;

        if let Some(represents) = file_entity.as_ref().and_then(entities::digital_representation_of) {
            ctx.add_metadata(&mut build.descriptor, REPRESENTS, vec![represents]).await;
        }

        let mut depicted = vec![qid.clone()];
        for id in entities::depicts(&entity) {
            if !depicted.contains(&id) {
                depicted.push(id);
            }
        }
        ctx.add_metadata(&mut build.descriptor, DEPICTS, depicted).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{build, context};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn sourceid_is_last_element() {
        assert_eq!(
            WikidataHandler
                .sourceid_from_url("https://www.wikidata.org/wiki/Q12418")
                .as_deref(),
            Some("Q12418")
        );
    }

    #[tokio::test]
    async fn external_manifest_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wikidata/wiki/Special:EntityData/Q5.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": {"Q5": {"claims": {
                    "P6108": [{"rank": "normal", "mainsnak": {"datavalue": {
                        "value": "https://museum.example/iiif/5/manifest.json"
                    }}}],
                    "P18": [{"rank": "normal", "mainsnak": {"datavalue": {"value": "X.jpg"}}}]
                }}}
            })))
            .mount(&server)
            .await;

        let ctx = context(&server.uri());
        let mut b = build(TAG, "Q5");
        WikidataHandler.init_manifest(&ctx, &mut b).await.unwrap();
        assert_eq!(
            b.external_manifest.as_deref(),
            Some("https://museum.example/iiif/5/manifest.json")
        );
        assert_eq!(b.descriptor.image_url(), None);
    }

    #[tokio::test]
    async fn image_entity_depicts_itself_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wikidata/wiki/Special:EntityData/Q12418.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": {"Q12418": {"claims": {
                    "P18": [{"rank": "normal", "mainsnak": {"datavalue": {"value": "Mona Lisa.jpg"}}}],
                    "P180": [
                        {"rank": "normal", "mainsnak": {"datavalue": {"value": {"id": "Q12418"}}}},
                        {"rank": "normal", "mainsnak": {"datavalue": {"value": {"id": "Q467"}}}}
                    ]
                }}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/commons/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": {"7": {
                    "pageid": 7,
                    "imageinfo": [{"width": 800, "height": 1200, "mime": "image/jpeg", "extmetadata": {}}]
                }}}
            })))
            .mount(&server)
            .await;

        let ctx = context(&server.uri());
        let mut b = build(TAG, "Q12418");
        WikidataHandler.init_manifest(&ctx, &mut b).await.unwrap();

        let d = &b.descriptor;
        assert!(d.image_url().unwrap().ends_with("/Mona_Lisa.jpg"));
        assert_eq!(d.height(), Some(1200));
        let depicts = d.find_metadata(DEPICTS).unwrap().value.values("en").to_vec();
        assert_eq!(depicts.len(), 2);
        assert!(depicts[0].contains("Q12418"));
        assert!(depicts[1].contains("Q467"));
    }
}
