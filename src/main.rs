// This is a simple example showing how to use the xval library
use ndarray::array;
use std::error::Error;
use xval::{FoldAssigner, Frame, Strategy};

fn main() -> Result<(), Box<dyn Error>> {
    println!("xval library example");

    let frame = Frame::new(
        vec!["x".to_string(), "y".to_string()],
        "class",
        array![
            [1.0, 2.0],
            [2.0, 1.0],
            [8.0, 9.0],
            [9.0, 8.0],
            [1.5, 1.5],
            [8.5, 8.5]
        ],
        vec!["a", "a", "b", "b", "a", "b"],
    )?;

    let folded = FoldAssigner::new(3, Strategy::Stratified).assign_with_seed(&frame, 42)?;
    println!("fold ids: {:?}", folded.fold_ids());
    println!("fold sizes: {:?}", folded.fold_counts());

    let (train, valid) = folded.split(0);
    println!(
        "fold 0: {} training rows, {} validation rows",
        train.n_rows(),
        valid.n_rows()
    );
    Ok(())
}
