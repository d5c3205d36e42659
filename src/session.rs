use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use crate::query::{GetWrt, SetWrt};
use crate::store::{OpenMode, Store};
use crate::{valid_name, Error};

pub struct Session {
	dir: Option<PathBuf>,
	temporary: bool,
}

impl Session {
	pub fn new() -> Self {
		Session { dir: None, temporary: false }
	}

	pub fn temporary(mut self) -> Self {
		self.temporary = true;
		self
	}

	pub fn with_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
		self.dir = Some(dir.into());
		self
	}

	pub fn in_world(&self, name: &str) -> Result<World, Error> {
		if !valid_name(name) {
			return Err(Error::InvalidName);
		}
		let dir = self.resolve_dir()?;
		let path = dir.join(format!("{name}.db"));
		Store::create(&path)?;
		info!(world = name, path = %path.display(), "opened world");
		Ok(World { path, temporary: self.temporary })
	}

	fn resolve_dir(&self) -> Result<PathBuf, Error> {
		if let Some(dir) = &self.dir {
			return if is_writable(dir) { Ok(dir.clone()) } else { Err(Error::NotWritable) };
		}
		let preferred = if self.temporary {
			Some(PathBuf::from("/tmp"))
		} else {
			std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
		};
		for dir in [preferred, dirs::home_dir()].into_iter().flatten() {
			if is_writable(&dir) {
				return Ok(dir);
			}
		}
		Err(Error::NotWritable)
	}
}

impl Default for Session {
	fn default() -> Self {
		Session::new()
	}
}

fn is_writable(dir: &Path) -> bool {
	let probe = dir.join(".wrt-probe");
	match OpenOptions::new().write(true).create(true).open(&probe) {
		Ok(_) => {
			_ = fs::remove_file(&probe);
			true
		}
		Err(_) => false,
	}
}

pub struct World {
	path: PathBuf,
	temporary: bool,
}

impl World {
	pub fn get(&self, subject: &str) -> Result<GetWrt<'_>, Error> {
		GetWrt::new(self, subject)
	}

	pub fn set(&self, subject: &str) -> Result<SetWrt<'_>, Error> {
		SetWrt::new(self, subject)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub(crate) fn open_store(&self, mode: OpenMode) -> Result<Store, Error> {
		Store::open(&self.path, mode)
	}
}

impl Drop for World {
	fn drop(&mut self) {
		if !self.temporary {
			return;
		}
		debug!(path = %self.path.display(), "removing temporary world");
		_ = fs::remove_file(&self.path);
		for suffix in ["-wal", "-shm"] {
			let mut sidecar = self.path.clone().into_os_string();
			sidecar.push(suffix);
			_ = fs::remove_file(PathBuf::from(sidecar));
		}
	}
}
