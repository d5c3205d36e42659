use std::path::Path;
use std::time::Duration;
use glam::DVec3;
use rusqlite::{params, Connection, OpenFlags, Row};
use tracing::debug;
use crate::algebra::{mat3_from_rows, mat3_to_rows, Pose};
use crate::Error;

pub const ROOT_FRAME: &str = "world";
pub const MAX_DEPTH: u32 = 100;
const BUSY_TIMEOUT: Duration = Duration::from_millis(10_000);

// One row per frame: pose of the frame with respect to its parent, with the
// translation expressed in the parent's coordinate system. Only the root has
// a NULL parent.
const SCHEMA: &str = "\
	CREATE TABLE IF NOT EXISTS frames( \
		name TEXT PRIMARY KEY, \
		parent TEXT, \
		R00 REAL, R01 REAL, R02 REAL, \
		R10 REAL, R11 REAL, R12 REAL, \
		R20 REAL, R21 REAL, R22 REAL, \
		t0 REAL, t1 REAL, t2 REAL \
	); \
	INSERT OR IGNORE INTO frames VALUES ('world', NULL, 1,0,0, 0,1,0, 0,0,1, 0,0,0);";

// Walks from the starting frame towards the root, composing the accumulator
// with each parent row: b' = r·b and (bx,by,bz)' = r·(bx,by,bz) + t. The
// deepest row wins; a non-NULL terminal parent means no root was reached.
const ROOT_WALK: &str = "\
	WITH RECURSIVE chain(depth, name, parent, \
		b00, b01, b02, b10, b11, b12, b20, b21, b22, bx, by, bz) AS ( \
		SELECT 0, name, parent, R00, R01, R02, R10, R11, R12, R20, R21, R22, t0, t1, t2 \
		FROM frames WHERE name = ?1 \
		UNION ALL \
		SELECT chain.depth + 1, f.name, f.parent, \
			f.R00*chain.b00 + f.R01*chain.b10 + f.R02*chain.b20, \
			f.R00*chain.b01 + f.R01*chain.b11 + f.R02*chain.b21, \
			f.R00*chain.b02 + f.R01*chain.b12 + f.R02*chain.b22, \
			f.R10*chain.b00 + f.R11*chain.b10 + f.R12*chain.b20, \
			f.R10*chain.b01 + f.R11*chain.b11 + f.R12*chain.b21, \
			f.R10*chain.b02 + f.R11*chain.b12 + f.R12*chain.b22, \
			f.R20*chain.b00 + f.R21*chain.b10 + f.R22*chain.b20, \
			f.R20*chain.b01 + f.R21*chain.b11 + f.R22*chain.b21, \
			f.R20*chain.b02 + f.R21*chain.b12 + f.R22*chain.b22, \
			f.R00*chain.bx + f.R01*chain.by + f.R02*chain.bz + f.t0, \
			f.R10*chain.bx + f.R11*chain.by + f.R12*chain.bz + f.t1, \
			f.R20*chain.bx + f.R21*chain.by + f.R22*chain.bz + f.t2 \
		FROM frames f JOIN chain ON f.name = chain.parent \
		WHERE chain.depth < ?2 \
	) \
	SELECT depth, name, parent, \
		b00, b01, b02, b10, b11, b12, b20, b21, b22, bx, by, bz \
	FROM chain ORDER BY depth DESC LIMIT 1";

#[derive(Clone, Debug, PartialEq)]
pub struct FrameRecord {
	pub name: String,
	pub parent: Option<String>,
	pub pose: Pose,
}

pub struct Walk {
	pub terminal: String,
	pub terminal_parent: Option<String>,
	pub depth: u32,
	pub pose: Pose,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
	ReadOnly,
	ReadWrite,
}

pub struct Store {
	conn: Connection,
}

impl Store {
	pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self, Error> {
		let flags = match mode {
			OpenMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
			OpenMode::ReadWrite =>
				OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
		};
		let conn = Connection::open_with_flags(path, flags)?;
		conn.busy_timeout(BUSY_TIMEOUT)?;
		if mode == OpenMode::ReadWrite {
			// Many small pose writes; losing the last few on a crash is acceptable.
			conn.pragma_update(None, "journal_mode", "WAL")?;
			conn.pragma_update(None, "synchronous", "NORMAL")?;
		}
		Ok(Store { conn })
	}

	pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
		let store = Store::open(path, OpenMode::ReadWrite)?;
		store.conn.execute_batch(SCHEMA)?;
		Ok(store)
	}

	pub fn open_in_memory() -> Result<Self, Error> {
		let conn = Connection::open_in_memory()?;
		conn.execute_batch(SCHEMA)?;
		Ok(Store { conn })
	}

	pub fn fetch(&self, name: &str) -> Result<Option<FrameRecord>, Error> {
		let mut stmt = self.conn.prepare(
			"SELECT name, parent, R00, R01, R02, R10, R11, R12, R20, R21, R22, t0, t1, t2 \
			FROM frames WHERE name = ?1",
		)?;
		let mut rows = stmt.query(params![name])?;
		let Some(row) = rows.next()? else { return Ok(None) };
		Ok(Some(record_from_row(row)?))
	}

	pub fn replace(&mut self, record: &FrameRecord) -> Result<(), Error> {
		let r = mat3_to_rows(&record.pose.r);
		let t = record.pose.t;
		let tx = self.conn.transaction()?;
		tx.execute("DELETE FROM frames WHERE name = ?1", params![record.name])?;
		tx.execute(
			"INSERT INTO frames VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
			params![
				record.name, record.parent,
				r[0], r[1], r[2], r[3], r[4], r[5], r[6], r[7], r[8],
				t.x, t.y, t.z,
			],
		)?;
		tx.commit()?;
		debug!(frame = %record.name, "stored frame");
		Ok(())
	}

	pub fn root_walk(&self, name: &str) -> Result<Option<Walk>, Error> {
		let mut stmt = self.conn.prepare(ROOT_WALK)?;
		let mut rows = stmt.query(params![name, MAX_DEPTH])?;
		let Some(row) = rows.next()? else { return Ok(None) };

		let mut b = [0.0; 9];
		for (i, v) in b.iter_mut().enumerate() {
			*v = row.get(3 + i)?;
		}
		let t = DVec3::new(row.get(12)?, row.get(13)?, row.get(14)?);
		Ok(Some(Walk {
			depth: row.get::<_, i64>(0)? as u32,
			terminal: row.get(1)?,
			terminal_parent: row.get(2)?,
			pose: Pose { r: mat3_from_rows(b), t }.snapped(),
		}))
	}
}

fn record_from_row(row: &Row) -> Result<FrameRecord, rusqlite::Error> {
	let mut r = [0.0; 9];
	for (i, v) in r.iter_mut().enumerate() {
		*v = row.get(2 + i)?;
	}
	let t = DVec3::new(row.get(11)?, row.get(12)?, row.get(13)?);
	Ok(FrameRecord {
		name: row.get(0)?,
		parent: row.get(1)?,
		pose: Pose { r: mat3_from_rows(r), t }.snapped(),
	})
}
