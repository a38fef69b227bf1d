//! Grid decoder tests against generated grid files.

use grid_geometry::{EGrid, GridError, InitFile, MapUnits, GLOBAL_GRID};
use test_utils::{
    assert_approx_eq, assert_point_approx_eq, require_test_file, temp_test_dir, GridBuilder,
    InitBuilder,
};

fn tilted() -> GridBuilder {
    GridBuilder::new(3, 2, 2).tilt(20.0, 0.0)
}

// =============================================================================
// Topology
// =============================================================================

#[test]
fn test_dimensions_and_paths() {
    let dir = temp_test_dir();
    let path = tilted().write(dir.path(), "CASE", false).unwrap();
    let grid = EGrid::open(&path).unwrap();

    assert_eq!(grid.grid_name(), "global");
    assert_eq!(grid.dimensions().as_array(), [3, 2, 2]);
    assert_eq!(grid.host_dimensions(), Some([3, 2, 2]));
    assert_eq!(grid.total_cells(), 12);
    assert_eq!(grid.active_cells(), 12);
    assert!(!grid.is_formatted());
    assert!(!grid.is_radial());
    assert!(grid.lgr_names().is_empty());
    assert!(grid.init_path().ends_with("CASE.INIT"));
}

#[test]
fn test_index_mapping_with_inactive_cells() {
    let dir = temp_test_dir();
    let path = GridBuilder::new(2, 2, 1)
        .actnum(vec![1, 0, 1, 1])
        .write(dir.path(), "CASE", false)
        .unwrap();
    let grid = EGrid::open(&path).unwrap();

    assert_eq!(grid.active_cells(), 3);
    assert_eq!(grid.active_index(1, 0, 0).unwrap(), None);
    assert_eq!(grid.active_index(0, 1, 0).unwrap(), Some(1));
    assert_eq!(grid.ijk_from_active(2).unwrap(), [1, 1, 0]);
    assert_eq!(grid.global_index(1, 1, 0).unwrap(), 3);
    assert_eq!(grid.ijk_from_global(2).unwrap(), [0, 1, 0]);

    assert!(matches!(grid.ijk_from_active(3), Err(GridError::OutOfRange(_))));
    assert!(matches!(grid.global_index(2, 0, 0), Err(GridError::OutOfRange(_))));
}

#[test]
fn test_actnum_length_must_match_cells() {
    let dir = temp_test_dir();
    let path = GridBuilder::new(2, 2, 1)
        .actnum(vec![1, 1, 1])
        .write(dir.path(), "CASE", false)
        .unwrap();

    assert!(matches!(EGrid::open(&path), Err(GridError::InconsistentData(_))));
}

// =============================================================================
// Geometry
// =============================================================================

#[test]
fn test_corners_follow_tilted_pillars() {
    let dir = temp_test_dir();
    let path = tilted().write(dir.path(), "CASE", false).unwrap();
    let grid = EGrid::open(&path).unwrap();

    let corners = grid.cell_corners([1, 0, 1]).unwrap();

    // pillar (1, 0) at mid depth and at the base
    assert_eq!(corners[0], [110.0, 0.0, 2010.0]);
    assert_eq!(corners[4], [120.0, 0.0, 2020.0]);
    // pillar (2, 1)
    assert_eq!(corners[3], [210.0, 100.0, 2010.0]);
    assert_eq!(corners[7], [220.0, 100.0, 2020.0]);

    assert_eq!(grid.cell_corners_global(7).unwrap(), corners);
    assert!(matches!(grid.cell_corners([0, 0, 2]), Err(GridError::OutOfRange(_))));
}

#[test]
fn test_coordinate_regions_select_pillar_block() {
    let dir = temp_test_dir();
    let path = GridBuilder::new(2, 1, 4)
        .coord_region(1, 2, 0.0)
        .coord_region(3, 4, 1000.0)
        .write(dir.path(), "CASE", false)
        .unwrap();
    let grid = EGrid::open(&path).unwrap();
    assert_eq!(grid.dimensions().num_regions, 2);

    let upper = grid.cell_corners([0, 0, 1]).unwrap();
    assert_point_approx_eq!(upper[0], [0.0, 0.0, 2010.0], 1e-9);
    assert_point_approx_eq!(upper[7], [200.0, 100.0, 2020.0], 1e-9);

    let lower = grid.cell_corners([1, 0, 2]).unwrap();
    assert_point_approx_eq!(lower[0], [1100.0, 0.0, 2020.0], 1e-9);
    assert_point_approx_eq!(lower[7], [1200.0, 100.0, 2030.0], 1e-9);

    let bottom = grid.cell_corners([0, 0, 3]).unwrap();
    assert_point_approx_eq!(bottom[4], [1000.0, 0.0, 2040.0], 1e-9);
}

#[test]
fn test_layer_slice_from_disk_matches_cached() {
    let dir = temp_test_dir();
    let path = tilted().write(dir.path(), "CASE", false).unwrap();
    let grid = EGrid::open(&path).unwrap();

    let from_disk = grid.layer_slice(1, 0..=2, 0..=1, false).unwrap();
    assert_eq!(from_disk.len(), 6 * 4);
    assert_eq!(from_disk[0], [10.0, 0.0, 2010.0]);

    // loads and caches ZCORN
    grid.cell_corners([0, 0, 0]).unwrap();
    let cached = grid.layer_slice(1, 0..=2, 0..=1, false).unwrap();
    assert_eq!(from_disk, cached);

    let bottom = grid.layer_slice_full(0, true).unwrap();
    assert!(bottom.iter().all(|p| p[2] == 2010.0));
}

#[test]
fn test_layer_slice_sub_box() {
    let dir = temp_test_dir();
    let path = tilted().write(dir.path(), "CASE", false).unwrap();
    let grid = EGrid::open(&path).unwrap();

    let points = grid.layer_slice(0, 2..=2, 1..=1, false).unwrap();
    assert_eq!(points.len(), 4);
    assert_eq!(points[0], [200.0, 100.0, 2000.0]);
    assert_eq!(points[3], [300.0, 200.0, 2000.0]);
}

#[test]
fn test_layer_slice_validates_arguments() {
    let dir = temp_test_dir();
    let path = tilted().write(dir.path(), "CASE", false).unwrap();
    let grid = EGrid::open(&path).unwrap();

    assert!(matches!(
        grid.layer_slice(2, 0..=2, 0..=1, false),
        Err(GridError::OutOfRange(_))
    ));
    assert!(matches!(
        grid.layer_slice(0, 0..=3, 0..=1, false),
        Err(GridError::OutOfRange(_))
    ));
    #[allow(clippy::reversed_empty_ranges)]
    let reversed = grid.layer_slice(0, 2..=1, 0..=1, false);
    assert!(matches!(reversed, Err(GridError::OutOfRange(_))));
}

#[test]
fn test_formatted_grid() {
    let dir = temp_test_dir();
    let binary = EGrid::open(tilted().write(dir.path(), "CASE", false).unwrap()).unwrap();
    let formatted = EGrid::open(tilted().write(dir.path(), "CASE", true).unwrap()).unwrap();

    assert!(formatted.is_formatted());
    assert!(formatted.init_path().ends_with("CASE.FINIT"));

    // partial reads need a binary file
    assert!(matches!(
        formatted.layer_slice(0, 0..=2, 0..=1, false),
        Err(GridError::InvalidOperation(_))
    ));

    for index in 0..binary.total_cells() {
        assert_eq!(
            formatted.cell_corners_global(index).unwrap(),
            binary.cell_corners_global(index).unwrap()
        );
    }

    // served from the cache once ZCORN is loaded
    assert_eq!(
        formatted.layer_slice_full(1, true).unwrap(),
        binary.layer_slice_full(1, true).unwrap()
    );
}

#[test]
fn test_radial_grid() {
    let dir = temp_test_dir();
    let path = GridBuilder::new(2, 4, 1)
        .cell_size(10.0, 90.0, 10.0)
        .radial()
        .write(dir.path(), "CASE", false)
        .unwrap();
    let grid = EGrid::open(&path).unwrap();

    assert!(grid.is_radial());
    let corners = grid.cell_corners([1, 1, 0]).unwrap();
    assert_approx_eq!(corners[0][0], 0.0, 1e-9);
    assert_approx_eq!(corners[0][1], 10.0, 1e-9);
    // pillar (2, 2): radius 20 at 180 degrees
    assert_approx_eq!(corners[3][0], -20.0, 1e-9);
    assert_approx_eq!(corners[3][1], 0.0, 1e-9);
}

// =============================================================================
// Map units and axes
// =============================================================================

#[test]
fn test_map_axes_rotation() {
    let dir = temp_test_dir();
    let path = GridBuilder::new(1, 1, 1)
        .map_units("METRES")
        .map_axes([900.0, 2000.0, 1000.0, 2000.0, 1000.0, 2100.0])
        .write(dir.path(), "CASE", false)
        .unwrap();
    let grid = EGrid::open(&path).unwrap();

    assert_eq!(grid.map_units(), Some(MapUnits::Metres));
    let mapped = grid.cell_corners_mapped([0, 0, 0]).unwrap();

    // local x runs north, local y runs west
    assert_point_approx_eq!(mapped[1], [1000.0, 2100.0, 2000.0], 1e-9);
    assert_point_approx_eq!(mapped[2], [900.0, 2000.0, 2000.0], 1e-9);
}

#[test]
fn test_map_axes_scaled_to_metres() {
    let dir = temp_test_dir();
    let path = GridBuilder::new(1, 1, 1)
        .map_units("FEET")
        .map_axes([0.0, 100.0, 0.0, 0.0, 100.0, 0.0])
        .write(dir.path(), "CASE", false)
        .unwrap();
    let grid = EGrid::open(&path).unwrap();

    assert_eq!(grid.map_units(), Some(MapUnits::Feet));
    let axes = grid.map_axes().unwrap();
    assert_approx_eq!(axes[1], 30.48, 1e-9);
    assert_approx_eq!(axes[4], 30.48, 1e-9);
}

#[test]
fn test_unsupported_map_units() {
    let dir = temp_test_dir();
    let path = GridBuilder::new(1, 1, 1)
        .map_units("YARDS")
        .write(dir.path(), "CASE", false)
        .unwrap();

    assert!(matches!(EGrid::open(&path), Err(GridError::UnsupportedUnit(u)) if u == "YARDS"));
}

#[test]
fn test_degenerate_map_axes() {
    let dir = temp_test_dir();
    let path = GridBuilder::new(1, 1, 1)
        .map_axes([0.0, 0.0, 0.0, 0.0, 100.0, 0.0])
        .write(dir.path(), "CASE", false)
        .unwrap();

    assert!(matches!(EGrid::open(&path), Err(GridError::InconsistentData(_))));
}

// =============================================================================
// Local grid refinements
// =============================================================================

fn with_lgr() -> GridBuilder {
    GridBuilder::new(3, 3, 1).lgr("LGR1", GridBuilder::new(2, 2, 2).cell_size(50.0, 50.0, 5.0), vec![5; 8])
}

#[test]
fn test_lgr_context() {
    let dir = temp_test_dir();
    let path = with_lgr().write(dir.path(), "CASE", false).unwrap();

    let global = EGrid::open(&path).unwrap();
    assert_eq!(global.lgr_names(), ["LGR1".to_string()]);
    assert!(global.host_cells().is_empty());

    let lgr = EGrid::open_grid(&path, "LGR1").unwrap();
    assert_eq!(lgr.grid_name(), "LGR1");
    assert_eq!(lgr.dimensions().as_array(), [2, 2, 2]);
    assert_eq!(lgr.host_dimensions(), Some([3, 3, 1]));
    assert_eq!(lgr.host_cells(), &[4; 8]);
    assert!(lgr.host_cells_ijk().unwrap().iter().all(|ijk| *ijk == [1, 1, 0]));

    let corners = lgr.cell_corners([1, 1, 1]).unwrap();
    assert_eq!(corners[7], [100.0, 100.0, 2010.0]);
}

#[test]
fn test_corrupt_cell_numbers() {
    let dir = temp_test_dir();
    let path = GridBuilder::new(3, 3, 1)
        .lgr("LGR1", GridBuilder::new(1, 1, 2), vec![5, 0])
        .write(dir.path(), "HOST", false)
        .unwrap();
    assert!(EGrid::open(&path).is_ok());
    assert!(matches!(
        EGrid::open_grid(&path, "LGR1"),
        Err(GridError::CorruptedData(_))
    ));

    let path = GridBuilder::new(2, 2, 1)
        .nnc(1, 0)
        .write(dir.path(), "NNC", false)
        .unwrap();
    let grid = EGrid::open(&path).unwrap();
    assert!(matches!(
        grid.non_neighbor_connections(),
        Err(GridError::CorruptedData(_))
    ));
}

#[test]
fn test_unknown_grid_name() {
    let dir = temp_test_dir();
    let path = with_lgr().write(dir.path(), "CASE", false).unwrap();

    assert!(matches!(
        EGrid::open_grid(&path, "LGR9"),
        Err(GridError::GridNotFound(name)) if name == "LGR9"
    ));
}

// =============================================================================
// Non-neighbor connections
// =============================================================================

fn with_nnc() -> GridBuilder {
    tilted().nnc(1, 12).nnc(2, 11)
}

#[test]
fn test_nnc_without_init_file() {
    let dir = temp_test_dir();
    let path = with_nnc().write(dir.path(), "CASE", false).unwrap();
    let grid = EGrid::open(&path).unwrap();

    let nncs = grid.non_neighbor_connections().unwrap();
    assert_eq!(nncs.len(), 2);
    assert_eq!((nncs[0].cell1, nncs[0].cell2), (0, 11));
    assert_eq!(nncs[0].transmissibility, None);

    let ijk = grid.nnc_ijk().unwrap();
    assert_eq!(ijk[0].ijk1, [0, 0, 0]);
    assert_eq!(ijk[0].ijk2, [2, 1, 1]);
    assert_eq!(ijk[1].ijk2, [1, 1, 1]);
}

#[test]
fn test_nnc_transmissibility_from_init() {
    let dir = temp_test_dir();
    let builder = with_nnc();
    let path = builder.write(dir.path(), "CASE", false).unwrap();
    InitBuilder::for_grid(&builder)
        .trannnc(vec![0.5, 1.5])
        .write(dir.path(), "CASE", false)
        .unwrap();

    let grid = EGrid::open(&path).unwrap();
    let nncs = grid.non_neighbor_connections().unwrap();
    assert_eq!(nncs[0].transmissibility, Some(0.5));
    assert_eq!(nncs[1].transmissibility, Some(1.5));

    let init = InitFile::open(grid.init_path()).unwrap();
    assert_eq!(init.grid_names(), vec![GLOBAL_GRID]);
    assert_eq!(init.grid_dimension(GLOBAL_GRID).unwrap(), grid.dimensions().as_array());
    assert_eq!(init.active_cells(GLOBAL_GRID).unwrap(), grid.active_cells());
}

#[test]
fn test_nnc_init_inconsistencies() {
    let builder = with_nnc();
    let cases = [
        InitBuilder::for_grid(&builder).trannnc(vec![0.5, 1.5]).active_cells(11),
        InitBuilder::for_grid(&builder).trannnc(vec![0.5, 1.5]).dims([3, 2, 3]),
        InitBuilder::for_grid(&builder).trannnc(vec![0.5]),
    ];

    for init in cases {
        let dir = temp_test_dir();
        let path = builder.write(dir.path(), "CASE", false).unwrap();
        init.write(dir.path(), "CASE", false).unwrap();

        let grid = EGrid::open(&path).unwrap();
        assert!(matches!(
            grid.non_neighbor_connections(),
            Err(GridError::InconsistentData(_))
        ));
    }
}

#[test]
fn test_grid_without_nnc() {
    let dir = temp_test_dir();
    let path = tilted().write(dir.path(), "CASE", false).unwrap();
    let grid = EGrid::open(&path).unwrap();
    assert!(grid.non_neighbor_connections().unwrap().is_empty());
}

// =============================================================================
// Real simulator output
// =============================================================================

#[test]
fn test_norne_grid() {
    let path = require_test_file!("NORNE_ATW2013.EGRID");
    let grid = EGrid::open(&path).unwrap();

    assert_eq!(grid.dimensions().as_array(), [46, 112, 22]);
    assert!(grid.active_cells() > 0);
    assert_eq!(grid.layer_slice_full(0, false).unwrap().len(), 46 * 112 * 4);
}
