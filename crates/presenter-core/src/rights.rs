//! Rights vocabularies.
//!
//! Two disjoint code tables: Creative Commons licenses and RightsStatements.org
//! statements. A code belongs to at most one of them. [`Rights::resolve`] maps a
//! short code plus optional version to the canonical URI.

const CC_DEFAULT_VERSION: &str = "4.0";
const CC_PD_VERSION: &str = "1.0";
const CC_PD_URL: &str = "http://creativecommons.org/publicdomain/zero/1.0/";
const CC_ICON_WIDTH: u32 = 88;
const CC_ICON_HEIGHT: u32 = 31;

const RS_DEFAULT_VERSION: &str = "1.0";

const CREATIVE_COMMONS: &[(&str, &str)] = &[
    ("CC0", "Public Domain Dedication"),
    ("PD", "Public Domain"),
    ("PUBLIC DOMAIN", "Public Domain"),
    ("PDM", "Public Domain Mark"),
    ("CC BY", "Attribution"),
    ("CC BY-SA", "Attribution-ShareAlike"),
    ("CC BY-ND", "Attribution-NoDerivs"),
    ("CC BY-NC", "Attribution-NonCommercial"),
    ("CC BY-NC-SA", "Attribution-NonCommercial-ShareAlike"),
    ("CC BY-NC-ND", "Attribution-NonCommercial-NoDerivs"),
];

const RIGHTS_STATEMENTS: &[(&str, &str)] = &[
    // in copyright
    ("InC", "IN COPYRIGHT"),
    ("InC-OW-EU", "IN COPYRIGHT - EU ORPHAN WORK"),
    ("InC-EDU", "IN COPYRIGHT - EDUCATIONAL USE PERMITTED"),
    ("InC-NC", "IN COPYRIGHT - NON-COMMERCIAL USE PERMITTED"),
    (
        "InC-RUU",
        "IN COPYRIGHT - RIGHTS-HOLDER(S) UNLOCATABLE OR UNIDENTIFIABLE",
    ),
    // not in copyright
    ("NoC-CR", "NO COPYRIGHT - CONTRACTUAL RESTRICTIONS"),
    ("NoC-NC", "NO COPYRIGHT - NON-COMMERCIAL USE ONLY"),
    ("NoC-OKLR", "NO COPYRIGHT - OTHER KNOWN LEGAL RESTRICTIONS"),
    ("NoC-US", "NO COPYRIGHT - UNITED STATES"),
    // other
    ("CNE", "COPYRIGHT NOT EVALUATED"),
    ("UND", "COPYRIGHT UNDETERMINED"),
    ("NKC", "NO KNOWN COPYRIGHT"),
];

/// Which table a rights code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RightsVocabulary {
    CreativeCommons,
    RightsStatements,
}

impl RightsVocabulary {
    /// Find the vocabulary that owns `code`.
    pub fn of(code: &str) -> Option<Self> {
        if CREATIVE_COMMONS.iter().any(|(c, _)| *c == code) {
            Some(Self::CreativeCommons)
        } else if RIGHTS_STATEMENTS.iter().any(|(c, _)| *c == code) {
            Some(Self::RightsStatements)
        } else {
            None
        }
    }
}

/// A resolved rights code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rights {
    vocabulary: RightsVocabulary,
    code: &'static str,
    label: &'static str,
    version: Option<String>,
}

impl Rights {
    /// Resolve a short code in either vocabulary.
    ///
    /// Returns `None` for codes neither table knows.
    pub fn resolve(code: &str, version: Option<&str>) -> Option<Self> {
        let version = version.filter(|v| !v.is_empty()).map(str::to_string);
        CREATIVE_COMMONS
            .iter()
            .map(|entry| (entry, RightsVocabulary::CreativeCommons))
            .chain(
                RIGHTS_STATEMENTS
                    .iter()
                    .map(|entry| (entry, RightsVocabulary::RightsStatements)),
            )
            .find(|((c, _), _)| *c == code)
            .map(|(&(code, label), vocabulary)| Self {
                vocabulary,
                code,
                label,
                version,
            })
    }

    pub fn code(&self) -> &str {
        self.code
    }

    pub fn label(&self) -> &str {
        self.label
    }

    pub fn vocabulary(&self) -> RightsVocabulary {
        self.vocabulary
    }

    fn is_public_domain(&self) -> bool {
        self.vocabulary == RightsVocabulary::CreativeCommons
            && matches!(self.code, "CC0" | "PUBLIC DOMAIN")
    }

    /// Explicit version, or the vocabulary default.
    pub fn version(&self) -> &str {
        match (&self.version, self.vocabulary) {
            (Some(v), _) => v.as_str(),
            (None, RightsVocabulary::RightsStatements) => RS_DEFAULT_VERSION,
            (None, RightsVocabulary::CreativeCommons) if self.is_public_domain() => CC_PD_VERSION,
            (None, RightsVocabulary::CreativeCommons) => CC_DEFAULT_VERSION,
        }
    }

    /// Canonical rights URI.
    pub fn url(&self) -> String {
        match self.vocabulary {
            RightsVocabulary::CreativeCommons if self.is_public_domain() => CC_PD_URL.to_string(),
            RightsVocabulary::CreativeCommons => format!(
                "http://creativecommons.org/licenses/{}/{}/",
                self.license_slug(),
                self.version()
            ),
            RightsVocabulary::RightsStatements => format!(
                "http://rightsstatements.org/vocab/{}/{}/",
                self.code,
                self.version()
            ),
        }
    }

    /// Badge image for the code.
    pub fn icon(&self) -> String {
        match self.vocabulary {
            RightsVocabulary::CreativeCommons if self.is_public_domain() => format!(
                "https://mirrors.creativecommons.org/presskit/buttons/{}x{}/png/cc-zero.png",
                CC_ICON_WIDTH, CC_ICON_HEIGHT
            ),
            RightsVocabulary::CreativeCommons => format!(
                "https://licensebuttons.net/l/{}/{}/{}x{}.png",
                self.license_slug(),
                self.version(),
                CC_ICON_WIDTH,
                CC_ICON_HEIGHT
            ),
            RightsVocabulary::RightsStatements => format!(
                "https://rightsstatements.org/files/buttons/{}.white.svg",
                self.code
            ),
        }
    }

    fn license_slug(&self) -> String {
        self.code
            .split_whitespace()
            .last()
            .unwrap_or(self.code)
            .to_lowercase()
    }
}

/// Resolve `code` and return its URI, if known.
pub fn rights_url(code: &str, version: Option<&str>) -> Option<String> {
    Rights::resolve(code, version).map(|r| r.url())
}

/// True when the rights URI is one of the CC licenses that require attribution.
pub fn is_attribution_required(rights: Option<&str>) -> bool {
    rights.is_some_and(|r| r.contains("creativecommons.org/licenses/by"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cc_by_default_version() {
        assert_eq!(
            rights_url("CC BY", None).unwrap(),
            "http://creativecommons.org/licenses/by/4.0/"
        );
    }

    #[test]
    fn cc_with_explicit_version() {
        assert_eq!(
            rights_url("CC BY-NC-SA", Some("2.0")).unwrap(),
            "http://creativecommons.org/licenses/by-nc-sa/2.0/"
        );
    }

    #[test]
    fn public_domain_codes_share_zero_url() {
        assert_eq!(rights_url("CC0", None).unwrap(), CC_PD_URL);
        assert_eq!(rights_url("PUBLIC DOMAIN", Some("3.0")).unwrap(), CC_PD_URL);
    }

    #[test]
    fn pdm_is_not_public_domain_dedication() {
        assert_eq!(
            rights_url("PDM", None).unwrap(),
            "http://creativecommons.org/licenses/pdm/4.0/"
        );
    }

    #[test]
    fn rights_statement_url() {
        assert_eq!(
            rights_url("InC-EDU", None).unwrap(),
            "http://rightsstatements.org/vocab/InC-EDU/1.0/"
        );
        assert_eq!(
            rights_url("UND", None).unwrap(),
            "http://rightsstatements.org/vocab/UND/1.0/"
        );
    }

    #[test]
    fn unknown_code() {
        assert!(rights_url("ALL RIGHTS RESERVED", None).is_none());
        assert_eq!(RightsVocabulary::of("nope"), None);
    }

    #[test]
    fn vocabularies_are_disjoint() {
        for (code, _) in CREATIVE_COMMONS {
            assert!(!RIGHTS_STATEMENTS.iter().any(|(c, _)| c == code));
        }
        assert_eq!(RightsVocabulary::of("CNE"), Some(RightsVocabulary::RightsStatements));
        assert_eq!(RightsVocabulary::of("CC BY"), Some(RightsVocabulary::CreativeCommons));
    }

    #[test]
    fn labels_and_icons() {
        let rights = Rights::resolve("CC BY-SA", None).unwrap();
        assert_eq!(rights.label(), "Attribution-ShareAlike");
        assert_eq!(rights.icon(), "https://licensebuttons.net/l/by-sa/4.0/88x31.png");

        let rs = Rights::resolve("NoC-US", None).unwrap();
        assert_eq!(rs.icon(), "https://rightsstatements.org/files/buttons/NoC-US.white.svg");
    }

    #[test]
    fn empty_version_falls_back_to_default() {
        let rights = Rights::resolve("CC BY", Some("")).unwrap();
        assert_eq!(rights.version(), "4.0");
    }

    #[test]
    fn attribution_required_only_for_by_licenses() {
        assert!(is_attribution_required(Some("http://creativecommons.org/licenses/by/4.0/")));
        assert!(is_attribution_required(Some("http://creativecommons.org/licenses/by-nc/2.0/")));
        assert!(!is_attribution_required(Some(CC_PD_URL)));
        assert!(!is_attribution_required(None));
    }
}
