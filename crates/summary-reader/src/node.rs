//! Summary series classification and canonical key synthesis.
//!
//! Every series in a specification file is described by a raw keyword, an
//! owner name (well, group, ...), an auxiliary number and, for refinement
//! series, an LGR descriptor. The keyword is normalized once into a
//! [`Category`], and the category alone decides the grammar of the key.

use once_cell::sync::Lazy;
use regex::Regex;

/// Owner name used by series without a well or group.
pub const NO_NAME: &str = ":+:+:+:+";

/// Segment keywords that are plain run-level quantities.
const MISC_SEGMENT_KEYWORDS: [&str; 3] = ["SEPARATE", "STEPTYPE", "SUMTHIN"];

static WELL_COMPLETION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^W[OGWLV][PIGOLCF][RT]L([0-9_]{2}[0-9])?$").expect("valid completion pattern")
});

static CONNECTION_COMPLETION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^C[OGW][IP][RT]L$").expect("valid completion pattern"));

/// Series category. Decides the grammar of the canonical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `KW:num`
    Aquifer,
    /// `KW:i,j,k`
    Block,
    /// `KW:owner:i,j,k`
    Connection,
    /// Well completion `KW:owner:num` or connection completion `KW:owner:i,j,k`
    Completion,
    /// Bare keyword
    Field,
    /// `KW:owner`
    Group,
    /// `KW:lgr:i,j,k`
    LocalBlock,
    /// `KW:lgr:owner:i,j,k`
    LocalConnection,
    /// `KW:lgr:owner`
    LocalWell,
    /// `KW:num`
    Region,
    /// `KW:r1-r2`
    RegionFlux,
    /// `KW:owner:num`
    Segment,
    /// `KW:owner`
    Well,
    /// Bare keyword
    Miscellaneous,
}

/// Normalize a raw keyword into its canonical spelling and category.
///
/// Well completion keywords lose their numeric suffix (`WOPRL__1` becomes
/// `WOPRL`); every other keyword is only trimmed.
pub fn normalize(raw: &str) -> (String, Category) {
    let keyword = raw.trim();

    if WELL_COMPLETION.is_match(keyword) {
        return (keyword[..5].to_string(), Category::Completion);
    }
    if CONNECTION_COMPLETION.is_match(keyword) {
        return (keyword.to_string(), Category::Completion);
    }

    let category = match keyword.as_bytes().first() {
        Some(b'A') => Category::Aquifer,
        Some(b'B') => Category::Block,
        Some(b'C') => Category::Connection,
        Some(b'F') => Category::Field,
        Some(b'G') => Category::Group,
        Some(b'L') => match keyword.as_bytes().get(1) {
            Some(b'B') => Category::LocalBlock,
            Some(b'C') => Category::LocalConnection,
            Some(b'W') => Category::LocalWell,
            _ => Category::Miscellaneous,
        },
        Some(b'R') if is_region_flux(keyword) => Category::RegionFlux,
        Some(b'R') => Category::Region,
        Some(b'S') if MISC_SEGMENT_KEYWORDS.contains(&keyword) => Category::Miscellaneous,
        Some(b'S') => Category::Segment,
        Some(b'W') => Category::Well,
        _ => Category::Miscellaneous,
    };

    (keyword.to_string(), category)
}

/// Inter-region flux keywords carry `FR` or `FT` at the third or fourth
/// character. `RORFR` is a plain region quantity.
fn is_region_flux(keyword: &str) -> bool {
    if keyword == "RORFR" {
        return false;
    }
    let flux = |range: std::ops::Range<usize>| matches!(keyword.get(range), Some("FR" | "FT"));
    flux(2..4) || flux(3..5)
}

/// Decode `num = r1 + 32768 * (r2 + 10)`.
pub fn region_pair(num: i32) -> (i32, i32) {
    (num % 32768, num / 32768 - 10)
}

/// One-based `(i, j, k)` of a one-based global cell number.
pub fn one_based_ijk(num: i32, dims: [i32; 3]) -> Option<[i32; 3]> {
    let [ni, nj, _] = dims;
    if num <= 0 || ni <= 0 || nj <= 0 {
        return None;
    }
    let mut g = num - 1;
    let i = 1 + g % ni;
    g /= ni;
    let j = 1 + g % nj;
    let k = 1 + g / nj;
    Some([i, j, k])
}

/// LGR descriptor of a refinement series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LgrCell {
    pub name: String,
    /// One-based position inside the LGR
    pub ijk: [i32; 3],
}

/// One series of a specification file.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryNode {
    /// Normalized keyword
    pub keyword: String,
    pub category: Category,
    pub owner: String,
    pub number: i32,
    pub unit: String,
    pub lgr: Option<LgrCell>,
}

impl SummaryNode {
    pub fn new(raw_keyword: &str, owner: &str, number: i32, unit: &str) -> Self {
        let (keyword, category) = normalize(raw_keyword);
        Self {
            keyword,
            category,
            owner: owner.trim().to_string(),
            number,
            unit: unit.trim().to_string(),
            lgr: None,
        }
    }

    pub fn with_lgr(mut self, lgr: Option<LgrCell>) -> Self {
        self.lgr = lgr.filter(|l| !l.name.is_empty());
        self
    }

    fn has_owner(&self) -> bool {
        !self.owner.is_empty() && self.owner != NO_NAME
    }

    /// Canonical key, `None` when the series is not addressable.
    ///
    /// `dims` are the grid dimensions declared by the specification file and
    /// decode block and connection cell numbers.
    pub fn key(&self, dims: [i32; 3]) -> Option<String> {
        let kw = &self.keyword;

        match self.category {
            Category::Field | Category::Miscellaneous => Some(kw.clone()),
            Category::Aquifer | Category::Region => {
                (self.number > 0).then(|| format!("{}:{}", kw, self.number))
            }
            Category::RegionFlux => (self.number > 0).then(|| {
                let (r1, r2) = region_pair(self.number);
                format!("{}:{}-{}", kw, r1, r2)
            }),
            Category::Block => {
                let [i, j, k] = one_based_ijk(self.number, dims)?;
                Some(format!("{}:{},{},{}", kw, i, j, k))
            }
            Category::Connection => self.connection_key(dims),
            Category::Completion if kw.starts_with('C') => self.connection_key(dims),
            Category::Completion => self
                .has_owner()
                .then(|| format!("{}:{}:{}", kw, self.owner, self.number)),
            Category::Group | Category::Well => {
                self.has_owner().then(|| format!("{}:{}", kw, self.owner))
            }
            Category::Segment => (self.has_owner() && self.number > 0)
                .then(|| format!("{}:{}:{}", kw, self.owner, self.number)),
            Category::LocalBlock => {
                let lgr = self.lgr.as_ref()?;
                let [i, j, k] = lgr.ijk;
                Some(format!("{}:{}:{},{},{}", kw, lgr.name, i, j, k))
            }
            Category::LocalConnection => {
                let lgr = self.lgr.as_ref()?;
                let [i, j, k] = lgr.ijk;
                Some(format!("{}:{}:{}:{},{},{}", kw, lgr.name, self.owner, i, j, k))
            }
            Category::LocalWell => {
                let lgr = self.lgr.as_ref()?;
                Some(format!("{}:{}:{}", kw, lgr.name, self.owner))
            }
        }
    }

    fn connection_key(&self, dims: [i32; 3]) -> Option<String> {
        let [i, j, k] = one_based_ijk(self.number, dims)?;
        Some(format!("{}:{}:{},{},{}", self.keyword, self.owner, i, j, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS: [i32; 3] = [60, 60, 5];

    fn key(keyword: &str, owner: &str, num: i32) -> Option<String> {
        SummaryNode::new(keyword, owner, num, "").key(DIMS)
    }

    fn lgr_key(keyword: &str, owner: &str, lgr: &str, ijk: [i32; 3]) -> Option<String> {
        SummaryNode::new(keyword, owner, 0, "")
            .with_lgr(Some(LgrCell {
                name: lgr.to_string(),
                ijk,
            }))
            .key(DIMS)
    }

    #[test]
    fn test_key_grammar() {
        let cases: &[(&str, &str, i32, Option<&str>)] = &[
            ("FOPT", NO_NAME, 0, Some("FOPT")),
            ("TIME", NO_NAME, 0, Some("TIME")),
            ("AAQR", NO_NAME, 2, Some("AAQR:2")),
            ("AAQR", NO_NAME, 0, None),
            ("BPR", NO_NAME, 12675, Some("BPR:15,32,4")),
            ("BPR", NO_NAME, 0, None),
            ("CWIR", "INJ", 1, Some("CWIR:INJ:1,1,1")),
            ("CWIR", "INJ", -1, None),
            ("COPRL", "PROD", 61, Some("COPRL:PROD:1,2,1")),
            ("GOPR", "G1", 0, Some("GOPR:G1")),
            ("GOPR", NO_NAME, 0, None),
            ("RPR", NO_NAME, 3, Some("RPR:3")),
            ("RPR", NO_NAME, 0, None),
            ("RWFT", NO_NAME, 425986, Some("RWFT:2-3")),
            ("ROFTG", NO_NAME, 425986, Some("ROFTG:2-3")),
            ("RORFR", NO_NAME, 4, Some("RORFR:4")),
            ("SOFR", "PROD", 7, Some("SOFR:PROD:7")),
            ("SOFR", "PROD", 0, None),
            ("SOFR", NO_NAME, 7, None),
            ("STEPTYPE", NO_NAME, 0, Some("STEPTYPE")),
            ("WOPR", "OP_1", 0, Some("WOPR:OP_1")),
            ("WOPR", NO_NAME, 0, None),
            ("WOPRL", "PROD", 2, Some("WOPRL:PROD:2")),
            ("WOPRL__1", "PROD", 1, Some("WOPRL:PROD:1")),
            ("ELAPSED", NO_NAME, 0, Some("ELAPSED")),
        ];

        for (keyword, owner, num, expected) in cases {
            assert_eq!(
                key(keyword, owner, *num).as_deref(),
                *expected,
                "{} {} {}",
                keyword,
                owner,
                num
            );
        }
    }

    #[test]
    fn test_lgr_keys() {
        assert_eq!(
            lgr_key("LBPR", NO_NAME, "LGR1", [2, 1, 3]).as_deref(),
            Some("LBPR:LGR1:2,1,3")
        );
        assert_eq!(
            lgr_key("LCWIR", "INJ", "LGR1", [1, 2, 1]).as_deref(),
            Some("LCWIR:LGR1:INJ:1,2,1")
        );
        assert_eq!(
            lgr_key("LWBHP", "PROD", "LGR2", [0, 0, 0]).as_deref(),
            Some("LWBHP:LGR2:PROD")
        );
        // without a descriptor the series is not addressable
        assert_eq!(key("LBPR", NO_NAME, 5), None);
        assert_eq!(key("LGRINFO", NO_NAME, 0).as_deref(), Some("LGRINFO"));
    }

    #[test]
    fn test_normalize_categories() {
        assert_eq!(normalize(" WOPR "), ("WOPR".to_string(), Category::Well));
        assert_eq!(normalize("WOPRL__1").1, Category::Completion);
        assert_eq!(normalize("COPRL").1, Category::Completion);
        assert_eq!(normalize("COPR").1, Category::Connection);
        assert_eq!(normalize("RGFT").1, Category::RegionFlux);
        assert_eq!(normalize("SUMTHIN").1, Category::Miscellaneous);
        assert_eq!(normalize("").1, Category::Miscellaneous);
    }

    #[test]
    fn test_one_based_ijk() {
        assert_eq!(one_based_ijk(1, [10, 10, 3]), Some([1, 1, 1]));
        assert_eq!(one_based_ijk(300, [10, 10, 3]), Some([10, 10, 3]));
        assert_eq!(one_based_ijk(12675, [60, 60, 5]), Some([15, 32, 4]));
        assert_eq!(one_based_ijk(5, [0, 10, 3]), None);
    }

    #[test]
    fn test_region_pair() {
        assert_eq!(region_pair(425986), (2, 3));
        assert_eq!(region_pair(1 + 32768 * 12), (1, 2));
    }
}
