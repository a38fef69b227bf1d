//! Common summary fixtures.
//!
//! Ready-made cases used across the summary tests. Series indices follow the
//! declaration order, so `TIME` is always series 0.

use crate::generators::{SummaryCase, NO_NAME};

/// Field, well, group and block series of a small field model.
///
/// | index | keyword | wgname | num |
/// |-------|---------|--------|-----|
/// | 0 | TIME | `NO_NAME` | 0 |
/// | 1 | FOPT | `NO_NAME` | 0 |
/// | 2 | WOPR | OP_1 | 0 |
/// | 3 | WOPR | OP_2 | 0 |
/// | 4 | GOPR | G1 | 0 |
/// | 5 | BPR | `NO_NAME` | 12675 |
/// | 6 | WOPR | `NO_NAME` | 0 |
pub fn field_case() -> SummaryCase {
    SummaryCase::new()
        .dims(60, 60, 5)
        .start(6, 11, 1997)
        .series("TIME", NO_NAME, 0, "DAYS")
        .series("FOPT", NO_NAME, 0, "SM3")
        .series("WOPR", "OP_1", 0, "SM3/DAY")
        .series("WOPR", "OP_2", 0, "SM3/DAY")
        .series("GOPR", "G1", 0, "SM3/DAY")
        .series("BPR", NO_NAME, 12675, "BARSA")
        .series("WOPR", NO_NAME, 0, "SM3/DAY")
}

/// Region, connection, LGR and miscellaneous series exercising every key form.
pub fn mixed_case() -> SummaryCase {
    SummaryCase::new()
        .dims(10, 10, 3)
        .series("TIME", NO_NAME, 0, "DAYS")
        .series("RPR", NO_NAME, 3, "BARSA")
        .series("RWFT", NO_NAME, 425986, "SM3")
        .series("CWIR", "INJ", 112, "SM3/DAY")
        .series("AAQR", NO_NAME, 2, "SM3/DAY")
        .series("SOFR", "PROD", 7, "SM3/DAY")
        .series("WOPRL__1", "PROD", 1, "SM3/DAY")
        .series("ELAPSED", NO_NAME, 0, "SECONDS")
        .lgr_series("LBPR", NO_NAME, "LGR1", [2, 1, 3], "BARSA")
        .lgr_series("LCWIR", "INJ", "LGR1", [1, 2, 1], "SM3/DAY")
        .lgr_series("LWBHP", "PROD", "LGR2", [0, 0, 0], "BARSA")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_case_declares_time_first() {
        let case = field_case();
        assert_eq!(case.series[0].keyword, "TIME");
        assert_eq!(case.series.len(), 7);
    }

    #[test]
    fn test_mixed_case_lgr_series() {
        let case = mixed_case();
        let lgr: Vec<_> = case.series.iter().filter(|s| s.lgr.is_some()).collect();
        assert_eq!(lgr.len(), 3);
    }
}
