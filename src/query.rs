use glam::DMat4;
use crate::algebra::Pose;
use crate::graph::FrameGraph;
use crate::session::World;
use crate::store::{OpenMode, ROOT_FRAME};
use crate::{valid_name, Error};

// Each stage owns the role names collected so far and offers only the next
// legal call, so a query can only be stated in the order
// get/set → wrt → ei → as_pose.

pub struct GetWrt<'w> {
	world: &'w World,
	subject: String,
}

impl<'w> GetWrt<'w> {
	pub(crate) fn new(world: &'w World, subject: &str) -> Result<Self, Error> {
		if !valid_name(subject) {
			return Err(Error::InvalidName);
		}
		Ok(GetWrt { world, subject: subject.to_string() })
	}

	pub fn wrt(self, basis: &str) -> Result<GetEi<'w>, Error> {
		if !valid_name(basis) {
			return Err(Error::InvalidName);
		}
		Ok(GetEi { world: self.world, subject: self.subject, basis: basis.to_string() })
	}
}

pub struct GetEi<'w> {
	world: &'w World,
	subject: String,
	basis: String,
}

impl GetEi<'_> {
	pub fn ei(self, csys: &str) -> Result<DMat4, Error> {
		if !valid_name(csys) {
			return Err(Error::InvalidName);
		}
		let store = self.world.open_store(OpenMode::ReadOnly)?;
		FrameGraph::new(store).resolve(&self.subject, &self.basis, csys)
	}
}

pub struct SetWrt<'w> {
	world: &'w World,
	subject: String,
}

impl<'w> SetWrt<'w> {
	pub(crate) fn new(world: &'w World, subject: &str) -> Result<Self, Error> {
		if !valid_name(subject) {
			return Err(Error::InvalidName);
		}
		if subject == ROOT_FRAME {
			return Err(Error::RootImmutable);
		}
		Ok(SetWrt { world, subject: subject.to_string() })
	}

	pub fn wrt(self, basis: &str) -> Result<SetEi<'w>, Error> {
		if !valid_name(basis) {
			return Err(Error::InvalidName);
		}
		if basis == self.subject {
			return Err(Error::SelfReference);
		}
		Ok(SetEi { world: self.world, subject: self.subject, basis: basis.to_string() })
	}
}

pub struct SetEi<'w> {
	world: &'w World,
	subject: String,
	basis: String,
}

impl<'w> SetEi<'w> {
	pub fn ei(self, csys: &str) -> Result<SetAs<'w>, Error> {
		if !valid_name(csys) {
			return Err(Error::InvalidName);
		}
		Ok(SetAs {
			world: self.world,
			subject: self.subject,
			basis: self.basis,
			csys: csys.to_string(),
		})
	}
}

pub struct SetAs<'w> {
	world: &'w World,
	subject: String,
	basis: String,
	csys: String,
}

impl SetAs<'_> {
	pub fn as_pose(self, matrix: &DMat4) -> Result<(), Error> {
		let pose = Pose::from_matrix(matrix)?;
		let store = self.world.open_store(OpenMode::ReadWrite)?;
		FrameGraph::new(store).store_pose(&self.subject, &self.basis, &self.csys, &pose)
	}
}
