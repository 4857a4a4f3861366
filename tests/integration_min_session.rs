// Drives the compiled binary through a PTY so the real event loop and
// crossterm input handling run end to end.
//
// Needs a TTY (expectrl allocates one), so it is Unix-only and ignored
// by default. Run with: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn short_level_then_quit() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("potholes");
    let cmd = format!("{} --level 1 --repair-delay-ms 50", bin.display());

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    // Hammer the first pothole and let the repair land
    p.send("H")?;
    std::thread::sleep(Duration::from_millis(200));

    // Out to the level selector, back to the menu, then quit
    p.send("\x1b")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("\x1b")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("q")?;

    p.expect(Eof)?;
    Ok(())
}
