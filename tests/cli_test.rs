use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn round_trip_test(dat: &[u8],extra_args: &[&str]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let orig_path = temp_dir.path().join("original.bin");
    let comp_path = temp_dir.path().join("compressed.huf");
    let exp_path = temp_dir.path().join("expanded.bin");
    std::fs::write(&orig_path,dat)?;
    let mut cmd = Command::cargo_bin("adahuff")?;
    cmd.arg("compress")
        .arg("-i").arg(&orig_path)
        .arg("-o").arg(&comp_path)
        .args(extra_args)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let mut cmd = Command::cargo_bin("adahuff")?;
    cmd.arg("expand")
        .arg("-i").arg(&comp_path)
        .arg("-o").arg(&exp_path)
        .args(extra_args)
        .assert()
        .success();
    match (std::fs::read(&orig_path),std::fs::read(&exp_path)) {
        (Ok(v1),Ok(v2)) => {
            assert_eq!(v1,v2);
        },
        _ => panic!("unable to compare output with original")
    }
    Ok(())
}

#[test]
fn text_round_trip() -> STDRESULT {
    let test_data = "The chaunt of the priests.  The chaunt of the priests of Mung.\n".repeat(8);
    round_trip_test(test_data.as_bytes(),&[])
}

#[test]
fn binary_round_trip() -> STDRESULT {
    let test_data: Vec<u8> = (0u8..=255).cycle().take(2048).collect();
    round_trip_test(&test_data,&[])
}

#[test]
fn dpcm_round_trip() -> STDRESULT {
    let test_data: Vec<u8> = (0..4096u32).map(|i| (i/16) as u8).collect();
    round_trip_test(&test_data,&["--dpcm"])
}

#[test]
fn narrow_alphabet_round_trip() -> STDRESULT {
    round_trip_test(b"sellsseashellsbytheseashore",&["--min-symbol","97","--max-symbol","122"])
}

#[test]
fn truncated_file_is_rejected() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let orig_path = temp_dir.path().join("original.bin");
    let comp_path = temp_dir.path().join("compressed.huf");
    let exp_path = temp_dir.path().join("expanded.bin");
    std::fs::write(&orig_path,"adaptive huffman coding")?;
    let mut cmd = Command::cargo_bin("adahuff")?;
    cmd.arg("compress")
        .arg("-i").arg(&orig_path)
        .arg("-o").arg(&comp_path)
        .assert()
        .success();
    let mut compressed = std::fs::read(&comp_path)?;
    compressed.pop();
    std::fs::write(&comp_path,&compressed)?;
    let mut cmd = Command::cargo_bin("adahuff")?;
    cmd.arg("expand")
        .arg("-i").arg(&comp_path)
        .arg("-o").arg(&exp_path)
        .assert()
        .failure();
    Ok(())
}
