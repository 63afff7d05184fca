//! End-to-end tests of line sampling, DEM probing and export

use approx::assert_abs_diff_eq;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use linenode::commands::ProcessCommand;
use linenode::input::parse_features;
use linenode::sampling::assembler::{AZIMUTH, DISTANCE, ELEVATION, KP, LATITUDE, LENGTH_3D, LONGITUDE, TOTAL_3D_LENGTH};
use linenode::{
    open_elevation_probe, CoordinateSystem, FieldValue, GeometrySampler, LineGeometry, LineNodeProcessor,
    CsvExporter, ExportSink, LinePath, Point, RowGroup, RunConfig,
};

const SHORT: u16 = 3;
const LONG: u16 = 4;
const ASCII: u16 = 2;
const DOUBLE: u16 = 12;
const FLOAT_FORMAT: u16 = 3;

fn utm31() -> CoordinateSystem {
    CoordinateSystem::UTM(31, true)
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("linenode_it_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn shorts(values: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for v in values {
        bytes.write_u16::<LittleEndian>(*v).unwrap();
    }
    bytes
}

fn longs(values: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for v in values {
        bytes.write_u32::<LittleEndian>(*v).unwrap();
    }
    bytes
}

fn doubles(values: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for v in values {
        bytes.write_f64::<LittleEndian>(*v).unwrap();
    }
    bytes
}

/// One-row float32 DEM in EPSG:32631, 1 m pixels, upper-left corner at
/// (500000, 1), no-data -9999
fn dem_tiff(values: &[f32]) -> Vec<u8> {
    let width = values.len() as u32;
    let mut pixels = Vec::new();
    for v in values {
        pixels.write_f32::<LittleEndian>(*v).unwrap();
    }

    let pixel_offset = 8u32;
    let nodata = b"-9999\0".to_vec();
    let entries: Vec<(u16, u16, u32, Vec<u8>)> = vec![
        (256, LONG, 1, longs(&[width])),
        (257, LONG, 1, longs(&[1])),
        (258, SHORT, 1, shorts(&[32])),
        (259, SHORT, 1, shorts(&[1])),
        (273, LONG, 1, longs(&[pixel_offset])),
        (277, SHORT, 1, shorts(&[1])),
        (278, LONG, 1, longs(&[1])),
        (279, LONG, 1, longs(&[pixels.len() as u32])),
        (339, SHORT, 1, shorts(&[FLOAT_FORMAT])),
        (33550, DOUBLE, 3, doubles(&[1.0, 1.0, 0.0])),
        (33922, DOUBLE, 6, doubles(&[0.0, 0.0, 0.0, 500000.0, 1.0, 0.0])),
        (34735, SHORT, 8, shorts(&[1, 1, 0, 1, 3072, 0, 1, 32631])),
        (42113, ASCII, nodata.len() as u32, nodata),
    ];

    let ifd_offset = pixel_offset + pixels.len() as u32;
    let ifd_size = 2 + 12 * entries.len() as u32 + 4;
    let mut extra_offset = ifd_offset + ifd_size;

    let mut ifd = Vec::new();
    let mut extra = Vec::new();
    ifd.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    for (tag, field_type, count, payload) in &entries {
        ifd.write_u16::<LittleEndian>(*tag).unwrap();
        ifd.write_u16::<LittleEndian>(*field_type).unwrap();
        ifd.write_u32::<LittleEndian>(*count).unwrap();
        if payload.len() <= 4 {
            let mut inline = payload.clone();
            inline.resize(4, 0);
            ifd.extend_from_slice(&inline);
        } else {
            ifd.write_u32::<LittleEndian>(extra_offset).unwrap();
            extra.extend_from_slice(payload);
            if payload.len() % 2 == 1 {
                extra.push(0);
            }
            extra_offset = ifd_offset + ifd_size + extra.len() as u32;
        }
    }
    ifd.write_u32::<LittleEndian>(0).unwrap();

    let mut file = Vec::new();
    file.extend_from_slice(b"II");
    file.write_u16::<LittleEndian>(42).unwrap();
    file.write_u32::<LittleEndian>(ifd_offset).unwrap();
    file.extend_from_slice(&pixels);
    file.extend_from_slice(&ifd);
    file.extend_from_slice(&extra);
    file
}

/// Elevation 0.5 m per column, column 7 set to no-data
fn ramp_dem(dir: &PathBuf) -> PathBuf {
    let mut values: Vec<f32> = (0..20).map(|c| c as f32 * 0.5).collect();
    values[7] = -9999.0;
    let path = dir.join("dem.tif");
    fs::write(&path, dem_tiff(&values)).unwrap();
    path
}

fn line_collection(coordinates: &str, properties: &str) -> String {
    format!(
        r#"{{ "type": "FeatureCollection",
             "crs": {{ "type": "name", "properties": {{ "name": "urn:ogc:def:crs:EPSG::32631" }} }},
             "features": [ {{ "type": "Feature", "id": 0, "properties": {},
                              "geometry": {{ "type": "LineString", "coordinates": {} }} }} ] }}"#,
        properties, coordinates
    )
}

fn run(processor: &LineNodeProcessor, coordinates: &str) -> RowGroup {
    let source = parse_features(&line_collection(coordinates, "{}")).unwrap();
    let mut groups = processor.process_all(&source.features, &AtomicBool::new(false));
    assert_eq!(groups.len(), 1);
    groups.remove(0)
}

fn column(group: &RowGroup, name: &str) -> Vec<Option<f64>> {
    group.rows.iter().map(|row| row.get_f64(name)).collect()
}

#[test]
fn test_straight_line_fixed_step() {
    let processor = LineNodeProcessor::new(utm31(), 5.0, false, true);
    let group = run(&processor, "[[500000, 0], [500010, 0]]");

    assert_eq!(group.key, "feat_0");
    assert_eq!(column(&group, KP), vec![Some(0.0), Some(5.0), Some(10.0)]);
    assert_eq!(column(&group, AZIMUTH), vec![None, Some(90.0), Some(90.0)]);
    assert_eq!(column(&group, DISTANCE), vec![None, Some(5.0), Some(5.0)]);
    assert!(group.rows.iter().all(|row| row.get(LENGTH_3D) == Some(&FieldValue::Missing)));
    assert!(group.rows.iter().all(|row| row.get(TOTAL_3D_LENGTH) == Some(&FieldValue::Missing)));

    let first = &group.rows[0];
    assert_abs_diff_eq!(first.get_f64(LONGITUDE).unwrap(), 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(first.get_f64(LATITUDE).unwrap(), 0.0, epsilon = 1e-9);
}

#[test]
fn test_vertices_only() {
    let processor = LineNodeProcessor::new(utm31(), 0.0, false, true);
    let group = run(&processor, "[[500000, 0], [500010, 0]]");
    assert_eq!(column(&group, KP), vec![Some(0.0), Some(10.0)]);
    assert_eq!(processor.label(), "verts");
}

#[test]
fn test_step_longer_than_line_keeps_endpoint() {
    let coordinates = "[[500000, 0], [500010, 0], [500010, 10]]";

    let processor = LineNodeProcessor::new(utm31(), 100.0, false, true);
    assert_eq!(column(&run(&processor, coordinates), KP), vec![Some(0.0), Some(20.0)]);

    let processor = LineNodeProcessor::new(utm31(), 100.0, true, true);
    let group = run(&processor, coordinates);
    assert_eq!(column(&group, KP), vec![Some(0.0), Some(10.0), Some(20.0)]);
    assert_eq!(column(&group, AZIMUTH), vec![None, Some(90.0), Some(0.0)]);
}

#[test]
fn test_slope_length_from_dem() {
    let dir = scratch_dir("slope");
    let probe = open_elevation_probe(ramp_dem(&dir), 1, Some(utm31()), None).unwrap();
    assert_eq!(probe.nodata(), Some(-9999.0));

    let processor = LineNodeProcessor::new(utm31(), 5.0, false, false).with_elevation(probe);
    let group = run(&processor, "[[500000.5, 0.5], [500010.5, 0.5]]");

    assert_eq!(column(&group, ELEVATION), vec![Some(0.0), Some(2.5), Some(5.0)]);
    assert_eq!(column(&group, LENGTH_3D), vec![None, Some(5.5902), Some(5.5902)]);
    let totals = column(&group, TOTAL_3D_LENGTH);
    assert_eq!(totals[0], Some(0.0));
    assert_abs_diff_eq!(totals[2].unwrap(), 11.1804, epsilon = 1e-9);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_nodata_segment_is_flat() {
    let dir = scratch_dir("nodata");
    let probe = open_elevation_probe(ramp_dem(&dir), 1, Some(utm31()), None).unwrap();

    let processor = LineNodeProcessor::new(utm31(), 2.0, false, false).with_elevation(probe);
    let group = run(&processor, "[[500005.5, 0.5], [500009.5, 0.5]]");

    assert_eq!(column(&group, ELEVATION), vec![Some(2.5), None, Some(4.5)]);
    assert_eq!(column(&group, LENGTH_3D), column(&group, DISTANCE));
    assert_eq!(column(&group, TOTAL_3D_LENGTH), vec![Some(0.0), Some(2.0), Some(4.0)]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_points_off_the_dem_are_missing() {
    let dir = scratch_dir("off_dem");
    let probe = open_elevation_probe(ramp_dem(&dir), 1, Some(utm31()), None).unwrap();

    let processor = LineNodeProcessor::new(utm31(), 10.0, false, false).with_elevation(probe);
    let group = run(&processor, "[[500015.5, 0.5], [500035.5, 0.5]]");

    assert_eq!(column(&group, ELEVATION), vec![Some(7.5), None, None]);
    assert_eq!(column(&group, LENGTH_3D), vec![None, Some(10.0), Some(10.0)]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_band_is_rejected() {
    let dir = scratch_dir("band");
    assert!(open_elevation_probe(ramp_dem(&dir), 2, Some(utm31()), None).is_err());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_sampler_properties() {
    let paths = vec![
        vec![(0.0, 0.0), (13.0, 0.0)],
        vec![(0.0, 0.0), (3.0, 4.0), (3.0, 9.5), (-2.25, 11.0)],
        vec![(100.0, 100.0), (101.5, 98.0), (130.0, 140.0)],
    ];

    for points in paths {
        let path = LinePath::new(points.iter().map(|(x, y)| Point::new(*x, *y)).collect()).unwrap();
        let length: f64 = path.points().windows(2).map(|w| w[0].distance_to(&w[1])).sum();
        let sampler = GeometrySampler::new(2.5, false);
        let samples = sampler.sample_path(&path);

        assert_eq!(samples, sampler.sample_path(&path));

        let kps: Vec<f64> = samples.iter().map(|s| s.kp.unwrap()).collect();
        assert_eq!(kps[0], 0.0);
        assert_abs_diff_eq!(*kps.last().unwrap(), length, epsilon = 1e-9);
        for pair in kps[..kps.len() - 1].windows(2) {
            assert_abs_diff_eq!(pair[1] - pair[0], 2.5, epsilon = 1e-9);
        }

        let single = LineGeometry::single(path.clone());
        assert_eq!(sampler.sample_geometry(&single), samples);
    }
}

#[test]
fn test_groups_sharing_a_file_name_are_merged() {
    let dir = scratch_dir("shared_name");
    let source = parse_features(r#"{ "type": "FeatureCollection", "features": [
        { "type": "Feature", "properties": { "route": "A 1" },
          "geometry": { "type": "LineString", "coordinates": [[500000, 0], [500010, 0]] } },
        { "type": "Feature", "properties": { "route": "A/1" },
          "geometry": { "type": "LineString", "coordinates": [[500000, 5], [500010, 5]] } } ] }"#)
        .unwrap();

    let processor = LineNodeProcessor::new(utm31(), 5.0, false, false).with_group_field(Some("route"));
    let groups = processor.process_all(&source.features, &AtomicBool::new(false));
    let sinks: Vec<Box<dyn ExportSink>> = vec![Box::new(CsvExporter::new(&dir))];
    let written = processor.export_groups(&groups, &sinks).unwrap();
    assert_eq!(written, vec![dir.join("A_1_5_node.csv")]);

    let mut reader = csv::Reader::from_path(&written[0]).unwrap();
    let route = reader.headers().unwrap().iter().position(|name| name == "route").unwrap();
    let routes: Vec<String> = reader.records().map(|r| r.unwrap()[route].to_string()).collect();
    assert_eq!(routes, vec!["A 1", "A 1", "A 1", "A/1", "A/1", "A/1"]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_process_command_writes_outputs() {
    let dir = scratch_dir("command");
    let dem = ramp_dem(&dir);
    let input = dir.join("lines.geojson");
    fs::write(
        &input,
        line_collection("[[500000.5, 0.5], [500010.5, 0.5]]", r#"{ "route": "R 1", "KP": 99 }"#),
    )
    .unwrap();

    let out = dir.join("out");
    let config = RunConfig {
        input: Some(input),
        output_dir: Some(out.clone()),
        distance: Some(5.0),
        keep_vertices: false,
        group_field: Some("route".to_string()),
        elevation: Some(dem),
        ..RunConfig::default()
    };
    let written = ProcessCommand::from_config(config).unwrap().run().unwrap();
    assert_eq!(written, vec![out.join("R_1_5_node.csv"), out.join("R_1_5_node.geojson")]);

    let mut reader = csv::Reader::from_path(&written[0]).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(header, vec![
        "Longitude", "Latitude", "Easting", "Northing", "Elevation", "Distance", "Length_3D",
        "Azimuth", "KP", "Total_3D_Length", "route", "attr_route", "attr_KP",
    ]);

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(&records[0][5], "");
    assert_eq!(&records[1][6], "5.5902");
    assert_eq!(&records[2][8], "10.0");
    assert_eq!(&records[2][10], "R 1");
    assert_eq!(&records[2][12], "99");

    let points = parse_features(&fs::read_to_string(&written[1]).unwrap()).unwrap();
    assert_eq!(points.crs, Some(utm31()));
    assert_eq!(points.features.len(), 3);

    fs::remove_dir_all(&dir).unwrap();
}
