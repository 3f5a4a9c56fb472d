// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Small, well-known programs, run end to end

use intmachine::prelude::*;
use intmachine::{MachineError, NegativeAddress};

macro_rules! io_test {
    ($name: ident, $program: expr, [$($input: expr),*] => [$($output: expr),*]) => {
        #[test]
        fn $name() {
            let program = Program::parse($program).unwrap();
            assert_eq!(
                Machine::from_program(&program).run_with_inputs([$($input),*]),
                Ok(vec![$($output),*])
            );
        }
    };
}

const QUINE: &str = "109,1,204,-1,1001,100,1,100,1008,100,16,101,1006,101,0,99";

io_test!(quine, QUINE, [] => [109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99]);
io_test!(large_product, "1102,34915192,34915192,7,4,7,99,0", [] => [1_219_070_632_396_864]);
io_test!(large_literal, "104,1125899906842624,99", [] => [1_125_899_906_842_624]);
io_test!(positional_equals_8, "3,9,8,9,10,9,4,9,99,-1,8", [8] => [1]);
io_test!(positional_not_equal_8, "3,9,8,9,10,9,4,9,99,-1,8", [7] => [0]);
io_test!(positional_less_than_8, "3,9,7,9,10,9,4,9,99,-1,8", [5] => [1]);
io_test!(immediate_equals_8, "3,3,1108,-1,8,3,4,3,99", [8] => [1]);
io_test!(immediate_less_than_8, "3,3,1107,-1,8,3,4,3,99", [9] => [0]);
io_test!(positional_jump_zero, "3,12,6,12,15,1,13,14,13,4,13,99,-1,0,1,9", [0] => [0]);
io_test!(immediate_jump_nonzero, "3,3,1105,-1,9,1101,0,0,12,4,12,99,1", [-3] => [1]);

const COMPARE_TO_8: &str = "3,21,1008,21,8,20,1005,20,22,107,8,21,20,1006,20,31,1106,0,36,98,0,0,\
    1002,21,125,20,4,20,1105,1,46,104,999,1105,1,46,1101,1000,1,20,4,20,1105,1,46,98,99";

io_test!(compare_below, COMPARE_TO_8, [7] => [999]);
io_test!(compare_equal, COMPARE_TO_8, [8] => [1000]);
io_test!(compare_above, COMPARE_TO_8, [9] => [1001]);

#[test]
fn add_mul_final_memory() {
    let mut machine = Machine::new([1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]);
    assert_eq!(machine.run_through_inputs(empty()), Ok((vec![], State::Halted)));
    assert_eq!(machine.peek(0), Ok(3500));
    assert_eq!(machine.peek(3), Ok(70));
}

#[test]
fn self_modifying_programs() {
    let mut machine = Machine::new([1002, 4, 3, 4, 33]);
    assert_eq!(machine.run_with_inputs(empty()), Ok(vec![]));
    assert_eq!(machine.peek(4), Ok(99));

    let mut machine = Machine::new([1101, 100, -1, 4, 0]);
    assert_eq!(machine.run_with_inputs(empty()), Ok(vec![]));
    assert_eq!(machine.peek(4), Ok(99));
}

#[test]
fn memory_is_sparse() {
    // IN 1000000000000, OUT 1000000000000, OUT 999999999999
    let far = 1_000_000_000_000;
    let mut machine = Machine::new([3, far, 4, far, 4, far - 1, 99]);
    assert_eq!(machine.run_with_inputs([17]), Ok(vec![17, 0]));
    assert_eq!(machine.memory().len_primary(), 7);
    assert_eq!(machine.memory().overflow_len(), 1);
    assert_eq!(machine.peek(far), Ok(17));
    assert_eq!(machine.peek(-1), Err(NegativeAddress(-1)));
}

#[test]
fn missing_input_is_recoverable() {
    // IN 20, IN 21, ADD 20, 21, 22, OUT 22, HALT
    let mut machine = Machine::new([3, 20, 3, 21, 1, 20, 21, 22, 4, 22, 99]);
    assert_eq!(machine.run_through_inputs([20]), Ok((vec![], State::Awaiting)));
    assert_eq!(machine.program_counter(), 2);
    assert_eq!(machine.run_through_inputs(empty()), Ok((vec![], State::Awaiting)));
    assert_eq!(machine.run_through_inputs([22]), Ok((vec![42], State::Halted)));
}

#[test]
fn missing_input_from_a_queue_is_fatal() {
    let mut machine = Machine::new([3, 20, 3, 21, 1, 20, 21, 22, 4, 22, 99]);
    assert_eq!(
        machine.run_with_inputs([20]),
        Err(MachineError::InputExhausted { pc: 2 })
    );
    assert_eq!(machine.run_with_inputs([22]), Err(MachineError::Poisoned));
}

#[test]
fn program_text_round_trip() {
    let program = Program::parse(QUINE).unwrap();
    assert_eq!(program.to_string(), QUINE);
    assert_eq!(program.len(), 16);
}
