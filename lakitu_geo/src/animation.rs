//! Evaluation of keyframe animations into per-joint transforms.

use lakitu_gfx::util::Matrixf;
use serde::{Deserialize, Serialize};

/// Raw animation tables.
///
/// `index` holds `(cap, offset)` pairs, one per channel. The root joint has three
/// translation channels (some of which may be unused depending on the joint type), and
/// every joint has three rotation channels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationData {
    pub flags: u16,
    pub index: Vec<u16>,
    pub values: Vec<i16>,
}

/// Which root translation channels an animation drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    Full,
    YOnly,
    XzOnly,
    None,
}

impl AnimationData {
    pub const FLAG_VERTICAL_TRANSLATION: u16 = 0x08;
    pub const FLAG_LATERAL_TRANSLATION: u16 = 0x10;
    pub const FLAG_NO_TRANSLATION: u16 = 0x40;

    pub fn joint_type(&self) -> JointType {
        if self.flags & Self::FLAG_VERTICAL_TRANSLATION != 0 {
            JointType::YOnly
        } else if self.flags & Self::FLAG_LATERAL_TRANSLATION != 0 {
            JointType::XzOnly
        } else if self.flags & Self::FLAG_NO_TRANSLATION != 0 {
            JointType::None
        } else {
            JointType::Full
        }
    }

    /// The number of animated joints described by the index table.
    pub fn joint_count(&self) -> usize {
        (self.index.len() / 6).saturating_sub(1)
    }
}

/// Converts an s16 angle to degrees.
pub fn angle_to_degrees(value: i16) -> f32 {
    value as f32 * 180.0 / 32768.0
}

/// Reads channels sequentially out of an [AnimationData] at a fixed frame.
#[derive(Debug, Clone)]
pub struct AnimationEvaluator<'a> {
    data: &'a AnimationData,
    frame: i32,
    cursor: usize,
}

impl<'a> AnimationEvaluator<'a> {
    pub fn new(data: &'a AnimationData, frame: i32) -> Self {
        Self {
            data,
            frame,
            cursor: 0,
        }
    }

    pub fn frame(&self) -> i32 {
        self.frame
    }

    /// Reads the next channel value. Missing or out of range entries read as zero.
    pub fn read(&mut self) -> i16 {
        let cap = self.data.index.get(self.cursor).copied();
        let offset = self.data.index.get(self.cursor + 1).copied();
        self.cursor += 2;

        let (cap, offset) = match (cap, offset) {
            (Some(cap), Some(offset)) if cap > 0 => (cap as i64, offset as i64),
            _ => return 0,
        };
        let frame = self.frame as i64;
        let i = if frame < cap {
            offset + frame
        } else {
            offset + cap - 1
        };
        usize::try_from(i)
            .ok()
            .and_then(|i| self.data.values.get(i).copied())
            .unwrap_or(0)
    }

    fn skip(&mut self) {
        self.cursor += 2;
    }

    /// Computes the local transform of an animated part.
    ///
    /// Joint 0 restarts the channel cursor and adds the animated root translation to
    /// `translation`. The joint rotation is applied in x, y, z order, followed by the
    /// translation.
    pub fn joint_transform(&mut self, translation: [f32; 3], joint: usize) -> Matrixf {
        let mut t = translation;
        if joint == 0 {
            self.cursor = 0;
            match self.data.joint_type() {
                JointType::Full => {
                    t[0] += self.read() as f32;
                    t[1] += self.read() as f32;
                    t[2] += self.read() as f32;
                }
                JointType::YOnly => {
                    self.skip();
                    t[1] += self.read() as f32;
                    self.skip();
                }
                JointType::XzOnly => {
                    t[0] += self.read() as f32;
                    self.skip();
                    t[2] += self.read() as f32;
                }
                JointType::None => {
                    self.skip();
                    self.skip();
                    self.skip();
                }
            }
        }

        let rotation = [
            angle_to_degrees(self.read()),
            angle_to_degrees(self.read()),
            angle_to_degrees(self.read()),
        ];
        &Matrixf::translate(t) * &Matrixf::rotate_xyz(rotation)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-3)
    }

    fn vertical() -> AnimationData {
        // Root y channel animates over two frames, every other channel is constant.
        AnimationData {
            flags: AnimationData::FLAG_VERTICAL_TRANSLATION,
            index: vec![1, 0, 2, 1, 1, 0, 1, 0, 1, 0, 1, 0],
            values: vec![0, 50, 60],
        }
    }

    #[test]
    fn test_joint_type() {
        assert_eq!(vertical().joint_type(), JointType::YOnly);
        let mut data = vertical();
        data.flags = 0x10;
        assert_eq!(data.joint_type(), JointType::XzOnly);
        data.flags = 0x40;
        assert_eq!(data.joint_type(), JointType::None);
        data.flags = 0;
        assert_eq!(data.joint_type(), JointType::Full);
        assert_eq!(data.joint_count(), 1);
    }

    #[test]
    fn test_deserialize_partial() {
        let data: AnimationData =
            serde_json::from_str(r#"{ "flags": 8, "values": [0, 50, 60] }"#).unwrap();
        assert_eq!(data.joint_type(), JointType::YOnly);
        assert!(data.index.is_empty());
        assert_eq!(data.values, vec![0, 50, 60]);
    }

    #[test]
    fn test_read_clamps_to_last_frame() {
        let data = vertical();
        let mut eval = AnimationEvaluator::new(&data, 1);
        let m = eval.joint_transform([0.0; 3], 0);
        assert!(close(m.translation(), [0.0, 60.0, 0.0]));

        let mut eval = AnimationEvaluator::new(&data, 100);
        let m = eval.joint_transform([0.0; 3], 0);
        assert!(close(m.translation(), [0.0, 60.0, 0.0]));

        let mut eval = AnimationEvaluator::new(&data, 0);
        let m = eval.joint_transform([1.0, 2.0, 3.0], 0);
        assert!(close(m.translation(), [1.0, 52.0, 3.0]));
    }

    #[test]
    fn test_missing_entries_read_zero() {
        let data = AnimationData {
            flags: 0,
            index: vec![1, 7],
            values: vec![5],
        };
        let mut eval = AnimationEvaluator::new(&data, 0);
        assert_eq!(eval.read(), 0);
        assert_eq!(eval.read(), 0);

        let data = AnimationData {
            flags: 0,
            index: vec![0, 0],
            values: vec![5],
        };
        let mut eval = AnimationEvaluator::new(&data, 0);
        assert_eq!(eval.read(), 0);
    }

    #[test]
    fn test_rotation() {
        // Quarter turn around y on the second joint.
        let data = AnimationData {
            flags: AnimationData::FLAG_NO_TRANSLATION,
            index: vec![
                1, 0, 1, 0, 1, 0, // root translation
                1, 0, 1, 0, 1, 0, // joint 0 rotation
                1, 0, 1, 1, 1, 0, // joint 1 rotation
            ],
            values: vec![0, 16384],
        };
        let mut eval = AnimationEvaluator::new(&data, 0);
        let root = eval.joint_transform([0.0; 3], 0);
        assert!(close(root.transform_point([1.0, 0.0, 0.0]), [1.0, 0.0, 0.0]));

        let joint = eval.joint_transform([0.0, 0.0, 5.0], 1);
        assert!(close(joint.transform_point([1.0, 0.0, 0.0]), [0.0, 0.0, 4.0]));
    }
}
