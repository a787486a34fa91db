use rust_policy_nn::{Matrix, NetworkBuilder, NeuralNetwork};

fn xor() -> (Matrix, Matrix) {
    let x = Matrix::from_vec([4, 2], vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0]).unwrap();
    let y = Matrix::from_vec([4, 1], vec![0.0, 1.0, 1.0, 0.0]).unwrap();
    (x, y)
}

fn separates_xor(net: &NeuralNetwork, x: &Matrix, y: &Matrix) -> bool {
    let pred = net.predict(x).unwrap();
    pred.iter()
        .zip(y.iter())
        .all(|(&p, &t)| (p > 0.5) == (t > 0.5))
}

#[test]
fn one_hidden_relu_layer_learns_xor() {
    let (x, y) = xor();

    // A dead ReLU unit at init can stall a small network, so allow a few seeds.
    for seed in 0..10 {
        let mut net = NetworkBuilder::new(2)
            .unwrap()
            .dense(4)
            .unwrap()
            .relu()
            .dense(1)
            .unwrap()
            .build_with_seed(seed)
            .unwrap();

        let first = net.train(&x, &y, 1, 0.1).unwrap();
        let last = net.train(&x, &y, 10_000, 0.1).unwrap();
        assert!(last.is_finite());

        if separates_xor(&net, &x, &y) {
            assert!(last < first, "seed {seed}: first={first} last={last}");
            return;
        }
    }
    panic!("no seed in 0..10 learned XOR");
}

#[test]
fn wider_hidden_layer_fits_xor_closely() {
    let (x, y) = xor();
    let mut net = NetworkBuilder::new(2)
        .unwrap()
        .dense(16)
        .unwrap()
        .relu()
        .dense(1)
        .unwrap()
        .build_with_seed(0)
        .unwrap();

    let loss = net.train(&x, &y, 5_000, 0.05).unwrap();
    assert!(loss < 0.1, "loss={loss}");
    assert!(separates_xor(&net, &x, &y));
}
