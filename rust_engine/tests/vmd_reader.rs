mod common;

use std::io::Write;

use common::{camera_at, VmdBuilder};
use mmd_camera_importer::vmd::{Keyframe, NullProgress, ParsePhase, ParseProgress};
use mmd_camera_importer::{MmdError, VmdImporter, VmdSection};

fn sample() -> VmdBuilder {
    VmdBuilder::new()
        .model_name(b"\x83\x4a\x83\x81\x83\x89") // カメラ
        .bone(b"\x83\x5a\x83\x93\x83\x5e\x81\x5b", 10) // センター
        .bone(b"\x83\x5a\x83\x93\x83\x5e\x81\x5b", 0)
        .morph(b"\x82\xa0", 4, 1.0) // あ
        .camera(camera_at(30, 45))
        .camera(camera_at(0, 30))
        .camera(camera_at(15, 40))
        .light(0)
        .self_shadow(3)
        .self_shadow(1)
        .property(
            20,
            true,
            &[(b"\x89\x45\x91\xab\x82\x68\x82\x6a", true)], // 右足ＩＫ
        )
        .property(0, false, &[])
}

fn is_sorted<T: Keyframe>(keyframes: &[T]) -> bool {
    keyframes
        .windows(2)
        .all(|pair| pair[0].frame_number() <= pair[1].frame_number())
}

#[test]
fn round_trip_counts() {
    let bytes = sample().build();
    let mut importer = VmdImporter::from_bytes(bytes.clone());

    assert!(importer.validate());
    let report = importer.inspect().unwrap();
    assert_eq!(report.stream_len, bytes.len() as u64);
    assert_eq!(report.declared_len, bytes.len() as u64);
    assert_eq!(report.bone_keyframe_count, 2);
    assert_eq!(report.morph_keyframe_count, 1);
    assert_eq!(report.camera_keyframe_count, 3);
    assert_eq!(report.light_keyframe_count, 1);
    assert_eq!(report.self_shadow_keyframe_count, 2);
    assert_eq!(report.property_keyframe_count, 2);
    assert_eq!(report.ik_state_count, 1);

    let result = importer.parse();
    assert!(result.is_success());
    assert_eq!(result.bone_keyframes.len(), 2);
    assert_eq!(result.morph_keyframes.len(), 1);
    assert_eq!(result.camera_keyframes.len(), 3);
    assert_eq!(result.light_keyframes.len(), 1);
    assert_eq!(result.self_shadow_keyframes.len(), 2);
    assert_eq!(result.property_keyframes.len(), 2);
    assert_eq!(result.max_frame(), 30);
}

#[test]
fn text_fields_are_decoded() {
    let result = VmdImporter::from_bytes(sample().build()).parse();
    assert_eq!(result.header.model_name_str(), "カメラ");
    assert_eq!(result.bone_keyframes[0].bone_name, "センター");
    assert_eq!(result.morph_keyframes[0].morph_name, "あ");

    let with_ik = &result.property_keyframes[1];
    assert_eq!(with_ik.frame_number, 20);
    assert!(with_ik.visible);
    assert_eq!(with_ik.ik_states[0].ik_name, "右足ＩＫ");
    assert!(with_ik.ik_states[0].enabled);
    assert!(result.property_keyframes[0].ik_states.is_empty());
}

#[test]
fn every_section_is_sorted() {
    let result = VmdImporter::from_bytes(sample().build()).parse();
    assert!(is_sorted(&result.bone_keyframes));
    assert!(is_sorted(&result.morph_keyframes));
    assert!(is_sorted(&result.camera_keyframes));
    assert!(is_sorted(&result.light_keyframes));
    assert!(is_sorted(&result.self_shadow_keyframes));
    assert!(is_sorted(&result.property_keyframes));

    let frames: Vec<u32> = result.camera_keyframes.iter().map(|k| k.frame_number).collect();
    assert_eq!(frames, vec![0, 15, 30]);
    assert_eq!(result.camera_keyframes[1].view_angle, 40);
}

#[test]
fn camera_fields_survive() {
    let mut keyframe = camera_at(7, 27);
    keyframe.distance = -32.5;
    keyframe.position = glam::Vec3::new(1.0, 12.0, -3.0);
    keyframe.rotation = glam::Vec3::new(0.1, -0.2, 0.3);
    keyframe.interpolation[5] = 99;
    keyframe.perspective = 1;

    let bytes = VmdBuilder::new().camera(keyframe.clone()).build();
    let result = VmdImporter::from_bytes(bytes).parse();
    assert_eq!(result.camera_keyframes, vec![keyframe]);
    assert!(!result.camera_keyframes[0].is_perspective());
}

#[test]
fn truncation_anywhere_fails_validation() {
    let bytes = sample().build();
    for len in 0..bytes.len() {
        let mut importer = VmdImporter::from_bytes(bytes[..len].to_vec());
        assert!(!importer.validate(), "truncated at {} of {}", len, bytes.len());
        assert!(!importer.parse().is_success(), "parse succeeded at {}", len);
    }
}

#[test]
fn truncation_reports_section() {
    let bytes = VmdBuilder::new().camera(camera_at(0, 30)).build();
    // 头 50 + 骨骼/表情计数 8 + 相机计数 4 + 半条相机记录
    let mut importer = VmdImporter::from_bytes(bytes[..50 + 8 + 4 + 30].to_vec());
    assert!(matches!(
        importer.inspect(),
        Err(MmdError::TruncatedSection(VmdSection::CameraKeyFrames))
    ));

    let bytes = sample().build();
    let mut importer = VmdImporter::from_bytes(bytes[..bytes.len() - 3].to_vec());
    assert!(matches!(
        importer.inspect(),
        Err(MmdError::TruncatedSection(_))
    ));
}

#[test]
fn magic_must_match_exactly() {
    let mut bytes = sample().build();
    bytes[24] = b'1'; // ...0001
    let mut importer = VmdImporter::from_bytes(bytes);
    assert!(!importer.validate());
    assert!(matches!(importer.inspect(), Err(MmdError::FormatMismatch(_))));

    let mut bytes = sample().build();
    bytes[25] = b'!'; // 魔数后多一个字符
    assert!(!VmdImporter::from_bytes(bytes).validate());
}

#[test]
fn trailing_data_is_accepted() {
    let mut bytes = sample().build();
    bytes.extend_from_slice(&[0xff; 7]);
    let mut importer = VmdImporter::from_bytes(bytes);
    let report = importer.inspect().unwrap();
    assert!(report.has_trailing_data());
    assert!(importer.validate());
    assert_eq!(importer.parse().camera_keyframes.len(), 3);
}

#[test]
fn set_source_reads_from_file() {
    let path = std::env::temp_dir().join(format!("vmd_reader_{}.vmd", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&sample().build()).unwrap();
    }

    let mut importer = VmdImporter::new();
    importer.set_source(&path);
    assert_eq!(importer.source(), Some(path.as_path()));
    assert!(importer.validate());
    let result = importer.try_parse(&mut NullProgress).unwrap();
    assert_eq!(result.camera_keyframes.len(), 3);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_file_is_open_failure() {
    let mut importer = VmdImporter::open(std::env::temp_dir().join("does_not_exist_3f9a.vmd"));
    assert!(!importer.validate());
    assert!(matches!(
        importer.try_parse(&mut NullProgress),
        Err(MmdError::StreamOpenFailure { .. })
    ));
}

struct Recorder {
    fractions: Vec<(ParsePhase, f32)>,
    cancel_after_properties: Option<usize>,
    property_reports: usize,
}

impl ParseProgress for Recorder {
    fn report_progress(&mut self, phase: ParsePhase, fraction: f32) {
        if phase == ParsePhase::PropertyKeyFrames {
            self.property_reports += 1;
        }
        self.fractions.push((phase, fraction));
    }

    fn should_cancel(&self) -> bool {
        self.cancel_after_properties
            .is_some_and(|limit| self.property_reports > limit)
    }
}

#[test]
fn progress_covers_every_phase_in_order() {
    let mut recorder = Recorder {
        fractions: Vec::new(),
        cancel_after_properties: None,
        property_reports: 0,
    };
    let result = VmdImporter::from_bytes(sample().build()).try_parse(&mut recorder).unwrap();
    assert!(result.is_success());

    let mut phases: Vec<ParsePhase> = recorder.fractions.iter().map(|(phase, _)| *phase).collect();
    phases.dedup();
    assert_eq!(
        phases,
        vec![
            ParsePhase::Header,
            ParsePhase::BoneKeyFrames,
            ParsePhase::MorphKeyFrames,
            ParsePhase::CameraKeyFrames,
            ParsePhase::LightKeyFrames,
            ParsePhase::SelfShadowKeyFrames,
            ParsePhase::PropertyKeyFrames,
        ]
    );
    assert!(recorder
        .fractions
        .windows(2)
        .all(|pair| pair[0].1 <= pair[1].1));
    assert_eq!(recorder.fractions.last().map(|(_, f)| *f), Some(1.0));
}

#[test]
fn cancel_inside_property_section() {
    let mut recorder = Recorder {
        fractions: Vec::new(),
        // 属性段开始时汇报一次，第一条记录前再汇报一次
        cancel_after_properties: Some(1),
        property_reports: 0,
    };
    let mut importer = VmdImporter::from_bytes(sample().build());
    let result = importer.parse_with_progress(&mut recorder);
    assert!(!result.is_success());
    assert!(result.cancelled);

    assert!(matches!(
        VmdImporter::from_bytes(sample().build()).try_parse(&mut Recorder {
            fractions: Vec::new(),
            cancel_after_properties: Some(1),
            property_reports: 0,
        }),
        Err(MmdError::UserCancelled)
    ));
}
