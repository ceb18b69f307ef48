#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use mmd_camera_importer::vmd::{CameraKeyFrame, VMD_MAGIC};

/// 合成 VMD 字节流
#[derive(Default)]
pub struct VmdBuilder {
    model_name: Vec<u8>,
    bones: Vec<(Vec<u8>, u32)>,
    morphs: Vec<(Vec<u8>, u32, f32)>,
    cameras: Vec<CameraKeyFrame>,
    lights: Vec<u32>,
    self_shadows: Vec<u32>,
    properties: Vec<(u32, bool, Vec<(Vec<u8>, bool)>)>,
}

fn padded(bytes: &[u8], len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let n = bytes.len().min(len);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

impl VmdBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model_name(mut self, name: &[u8]) -> Self {
        self.model_name = name.to_vec();
        self
    }

    pub fn bone(mut self, name: &[u8], frame: u32) -> Self {
        self.bones.push((name.to_vec(), frame));
        self
    }

    pub fn morph(mut self, name: &[u8], frame: u32, weight: f32) -> Self {
        self.morphs.push((name.to_vec(), frame, weight));
        self
    }

    pub fn camera(mut self, keyframe: CameraKeyFrame) -> Self {
        self.cameras.push(keyframe);
        self
    }

    pub fn light(mut self, frame: u32) -> Self {
        self.lights.push(frame);
        self
    }

    pub fn self_shadow(mut self, frame: u32) -> Self {
        self.self_shadows.push(frame);
        self
    }

    pub fn property(mut self, frame: u32, visible: bool, ik_states: &[(&[u8], bool)]) -> Self {
        let ik_states = ik_states
            .iter()
            .map(|(name, enabled)| (name.to_vec(), *enabled))
            .collect();
        self.properties.push((frame, visible, ik_states));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&padded(VMD_MAGIC.as_bytes(), 30));
        out.extend_from_slice(&padded(&self.model_name, 20));

        out.write_u32::<LittleEndian>(self.bones.len() as u32).unwrap();
        for (name, frame) in &self.bones {
            out.extend_from_slice(&padded(name, 15));
            out.write_u32::<LittleEndian>(*frame).unwrap();
            for _ in 0..3 {
                out.write_f32::<LittleEndian>(0.0).unwrap();
            }
            for value in [0.0f32, 0.0, 0.0, 1.0] {
                out.write_f32::<LittleEndian>(value).unwrap();
            }
            out.extend_from_slice(&[20u8; 64]);
        }

        out.write_u32::<LittleEndian>(self.morphs.len() as u32).unwrap();
        for (name, frame, weight) in &self.morphs {
            out.extend_from_slice(&padded(name, 15));
            out.write_u32::<LittleEndian>(*frame).unwrap();
            out.write_f32::<LittleEndian>(*weight).unwrap();
        }

        out.write_u32::<LittleEndian>(self.cameras.len() as u32).unwrap();
        for camera in &self.cameras {
            out.write_u32::<LittleEndian>(camera.frame_number).unwrap();
            out.write_f32::<LittleEndian>(camera.distance).unwrap();
            for value in camera.position.to_array() {
                out.write_f32::<LittleEndian>(value).unwrap();
            }
            for value in camera.rotation.to_array() {
                out.write_f32::<LittleEndian>(value).unwrap();
            }
            for value in camera.interpolation {
                out.write_i8(value).unwrap();
            }
            out.write_u32::<LittleEndian>(camera.view_angle).unwrap();
            out.write_u8(camera.perspective).unwrap();
        }

        out.write_u32::<LittleEndian>(self.lights.len() as u32).unwrap();
        for frame in &self.lights {
            out.write_u32::<LittleEndian>(*frame).unwrap();
            for value in [0.6f32, 0.6, 0.6, -0.5, -1.0, 0.5] {
                out.write_f32::<LittleEndian>(value).unwrap();
            }
        }

        out.write_u32::<LittleEndian>(self.self_shadows.len() as u32).unwrap();
        for frame in &self.self_shadows {
            out.write_u32::<LittleEndian>(*frame).unwrap();
            out.write_u8(1).unwrap();
            out.write_f32::<LittleEndian>(0.0875).unwrap();
        }

        out.write_u32::<LittleEndian>(self.properties.len() as u32).unwrap();
        for (frame, visible, ik_states) in &self.properties {
            out.write_u32::<LittleEndian>(*frame).unwrap();
            out.write_u8(*visible as u8).unwrap();
            out.write_u32::<LittleEndian>(ik_states.len() as u32).unwrap();
            for (name, enabled) in ik_states {
                out.extend_from_slice(&padded(name, 20));
                out.write_u8(*enabled as u8).unwrap();
            }
        }

        out
    }
}

pub fn camera_at(frame: u32, view_angle: u32) -> CameraKeyFrame {
    let mut keyframe = CameraKeyFrame::new(frame);
    keyframe.view_angle = view_angle;
    keyframe
}
