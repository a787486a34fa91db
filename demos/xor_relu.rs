use rust_policy_nn::{Matrix, NetworkBuilder};

fn main() -> rust_policy_nn::Result<()> {
    // Classic XOR dataset.
    let x = Matrix::from_rows(&[
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ])?;
    let y = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![1.0], vec![0.0]])?;

    // 2 -> 8 -> ReLU -> 1, linear output trained with MSE.
    let mut net = NetworkBuilder::new(2)?
        .dense(8)?
        .relu()
        .dense(1)?
        .build_with_seed(0)?;

    let loss = net.train(&x, &y, 10_000, 0.1)?;
    println!("final_loss={loss}");

    let pred = net.predict(&x)?;
    for i in 0..x.rows() {
        println!("x={:?} y={:.4}", x.row(i)?, pred[[i, 0]]);
    }
    Ok(())
}
