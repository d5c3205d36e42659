use std::path::PathBuf;
use std::process::ExitCode;
use clap::{ArgGroup, Parser};
use glam::DMat4;
use tracing_subscriber::EnvFilter;
use wrt::algebra::{mat4_from_rows, mat4_to_rows};
use wrt::{Error, Session};

#[derive(Parser)]
#[command(name = "wrt", version, about = "Get and set rigid-body poses among named reference frames")]
#[command(group(ArgGroup::new("op").required(true).args(["get", "set"])))]
struct Cli {
	/// World the frame lives in ([a-z][0-9]-)
	#[arg(long = "In", value_name = "WORLD")]
	in_world: String,
	/// Name of the frame to get ([a-z][0-9]-)
	#[arg(long = "Get", value_name = "NAME")]
	get: Option<String>,
	/// Name of the frame to set ([a-z][0-9]-)
	#[arg(long = "Set", value_name = "NAME", requires = "pose")]
	set: Option<String>,
	/// Reference frame the pose is described with respect to ([a-z][0-9]-)
	#[arg(long = "Wrt", value_name = "BASIS")]
	wrt: String,
	/// Reference frame the pose is expressed in ([a-z][0-9]-)
	#[arg(long = "Ei", value_name = "CSYS")]
	ei: String,
	/// Pose as a row-major matrix [[R00,R01,R02,t0],[R10,R11,R12,t1],[R20,R21,R22,t2],[0,0,0,1]]
	#[arg(long = "As", value_name = "STRING")]
	pose: Option<String>,
	/// Path to the directory in which the database is located
	#[arg(short, long, value_name = "DIR")]
	dir: Option<PathBuf>,
	/// Output the matrix as a comma separated list of 16 numbers in row-major order
	#[arg(short, long)]
	compact: bool,
	/// If a problem arises, do not output any information, fail quietly
	#[arg(short, long)]
	quiet: bool,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
	#[error("the --As string must contain 16 comma-separated numbers")]
	BadPoseString,
	#[error(transparent)]
	Wrt(#[from] Error),
}

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_writer(std::io::stderr)
		.init();

	let cli = Cli::parse();
	match run(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			if !cli.quiet {
				eprintln!("Error: {err}");
			}
			ExitCode::FAILURE
		}
	}
}

fn run(cli: &Cli) -> Result<(), CliError> {
	let mut session = Session::new();
	if let Some(dir) = &cli.dir {
		session = session.with_dir(dir);
	}
	let world = session.in_world(&cli.in_world)?;

	if let Some(subject) = &cli.set {
		let matrix = parse_pose(cli.pose.as_deref().unwrap_or_default())?;
		world.set(subject)?.wrt(&cli.wrt)?.ei(&cli.ei)?.as_pose(&matrix)?;
	} else if let Some(subject) = &cli.get {
		let matrix = world.get(subject)?.wrt(&cli.wrt)?.ei(&cli.ei)?;
		print_pose(&matrix, cli.compact);
	}
	Ok(())
}

fn parse_pose(text: &str) -> Result<DMat4, CliError> {
	let stripped: String = text.chars().filter(|c| !"[] \r\n\t".contains(*c)).collect();
	let fields: Vec<&str> = stripped.split(',').collect();
	if fields.len() != 16 || !fields.iter().all(|field| plain_number(field)) {
		return Err(CliError::BadPoseString);
	}

	let mut n = [0.0; 16];
	for (v, field) in n.iter_mut().zip(&fields) {
		*v = field.parse().map_err(|_| CliError::BadPoseString)?;
	}
	Ok(mat4_from_rows([
		[n[0], n[1], n[2], n[3]],
		[n[4], n[5], n[6], n[7]],
		[n[8], n[9], n[10], n[11]],
		[n[12], n[13], n[14], n[15]],
	]))
}

// Optional sign, digits, optional fractional digits. No exponents.
fn plain_number(s: &str) -> bool {
	let s = match s.as_bytes().first() {
		Some(b'+') | Some(b'-') => &s[1..],
		_ => s,
	};
	match s.split_once('.') {
		Some((int, frac)) => is_digits(int) && is_digits(frac),
		None => is_digits(s),
	}
}

fn is_digits(s: &str) -> bool {
	!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn print_pose(matrix: &DMat4, compact: bool) {
	let rows = mat4_to_rows(matrix);
	if compact {
		let entries: Vec<String> = rows.iter().flatten().map(f64::to_string).collect();
		println!("{}", entries.join(","));
	} else {
		for row in rows {
			println!("{:>12.6} {:>12.6} {:>12.6} {:>12.6}", row[0], row[1], row[2], row[3]);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{parse_pose, plain_number};

	#[test]
	fn parses_a_bracketed_matrix() {
		let m = parse_pose("[[1,0,0,1],\n [0,1,0,2],\n [0,0,1,3],\n [0,0,0,1]]").unwrap();
		assert_eq!(m.w_axis.truncate(), glam::DVec3::new(1.0, 2.0, 3.0));
		assert_eq!(m.x_axis.x, 1.0);
	}

	#[test]
	fn parses_signs_and_fractions() {
		let m = parse_pose("1,0,0,-1.5, 0,1,0,+0.25, 0,0,1,0, 0,0,0,1").unwrap();
		assert_eq!(m.w_axis.truncate(), glam::DVec3::new(-1.5, 0.25, 0.0));
	}

	#[test]
	fn rejects_malformed_strings() {
		assert!(parse_pose("").is_err());
		assert!(parse_pose("1,2,3").is_err());
		assert!(parse_pose("1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1e0").is_err());
		assert!(parse_pose("1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,x").is_err());
		assert!(parse_pose("1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,.5").is_err());
	}

	#[test]
	fn number_grammar() {
		assert!(plain_number("0"));
		assert!(plain_number("-12.5"));
		assert!(plain_number("+3"));
		assert!(!plain_number(""));
		assert!(!plain_number("-"));
		assert!(!plain_number("1."));
		assert!(!plain_number("1e5"));
	}
}
