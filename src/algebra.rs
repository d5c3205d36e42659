use glam::{DMat3, DMat4, DQuat, DVec3, DVec4};

// Orthogonality and determinant checks allow accumulated rounding noise;
// the last row of a pose matrix is checked exactly.
const SO3_TOLERANCE: f64 = 100.0 * f64::EPSILON;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixError {
	#[error("the rotation block is not orthogonal")]
	NotOrthogonal,
	#[error("the rotation block does not have determinant +1")]
	WrongDeterminant,
	#[error("the last row is not [0, 0, 0, 1]")]
	BadLastRow,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
	pub r: DMat3,
	pub t: DVec3,
}

impl Pose {
	pub const IDENTITY: Pose = Pose { r: DMat3::IDENTITY, t: DVec3::ZERO };

	pub fn from_matrix(m: &DMat4) -> Result<Pose, MatrixError> {
		let r = DMat3::from_mat4(*m);
		if frobenius(r * r.transpose() - DMat3::IDENTITY) > SO3_TOLERANCE {
			return Err(MatrixError::NotOrthogonal);
		}
		if (r.determinant() - 1.0).abs() > SO3_TOLERANCE {
			return Err(MatrixError::WrongDeterminant);
		}
		if m.row(3) != DVec4::new(0.0, 0.0, 0.0, 1.0) {
			return Err(MatrixError::BadLastRow);
		}
		Ok(Pose { r, t: m.w_axis.truncate() })
	}

	pub fn to_matrix(&self) -> DMat4 {
		DMat4::from_cols(
			self.r.x_axis.extend(0.0),
			self.r.y_axis.extend(0.0),
			self.r.z_axis.extend(0.0),
			self.t.extend(1.0),
		)
	}

	pub fn compose(&self, rhs: &Pose) -> Pose {
		Pose { r: self.r * rhs.r, t: self.r * rhs.t + self.t }
	}

	pub fn inverse(&self) -> Pose {
		let rt = self.r.transpose();
		Pose { r: rt, t: -(rt * self.t) }
	}

	// Rigid-pose reversal: transposes the rotation but negates the
	// translation in place, without re-expressing it.
	pub fn reversed(&self) -> Pose {
		Pose { r: self.r.transpose(), t: -self.t }
	}

	pub fn rotation_quat(&self) -> DQuat {
		DQuat::from_mat3(&self.r).normalize()
	}

	pub fn from_quat(q: DQuat, t: DVec3) -> Pose {
		Pose { r: DMat3::from_quat(q), t }
	}

	pub fn snapped(&self) -> Pose {
		Pose {
			r: DMat3::from_cols_array(&self.r.to_cols_array().map(snap)),
			t: DVec3::from_array(self.t.to_array().map(snap)),
		}
	}
}

fn snap(v: f64) -> f64 {
	if v.abs() < f64::EPSILON { 0.0 } else { v }
}

fn frobenius(m: DMat3) -> f64 {
	m.to_cols_array().iter().map(|v| v * v).sum::<f64>().sqrt()
}

pub fn mat3_from_rows(rows: [f64; 9]) -> DMat3 {
	DMat3::from_cols_array(&rows).transpose()
}

pub fn mat3_to_rows(m: &DMat3) -> [f64; 9] {
	m.transpose().to_cols_array()
}

pub fn mat4_from_rows(rows: [[f64; 4]; 4]) -> DMat4 {
	DMat4::from_cols_array_2d(&rows).transpose()
}

pub fn mat4_to_rows(m: &DMat4) -> [[f64; 4]; 4] {
	m.transpose().to_cols_array_2d()
}
