use alnbench_seq::{BioString, ClosedRange, Grammar};

fn amino(seq: &str) -> BioString {
    BioString::new(seq, Grammar::Amino)
}

#[test]
fn construction_strips_whitespace() {
    let bs = BioString::new("AB \tCD\nEF", Grammar::Amino);
    assert_eq!(bs, "ABCDEF");
    assert_eq!(bs.len(), 6);
    assert_eq!(bs.grammar(), Grammar::Amino);
}

#[test]
fn strict_equality_distinguishes_gap_styles() {
    assert_eq!(amino("ABC---DEF"), amino("ABC---DEF"));
    assert_ne!(amino("ABC...DEF"), amino("ABC---DEF"));
    // Grammar is part of strict equality
    assert_ne!(amino("ACGT"), BioString::new("ACGT", Grammar::Dna));
}

#[test]
fn equivalence_ignores_gap_styles() {
    let x = amino("ABC...DEF");
    assert!(x.is_equivalent_to(&amino("ABC---DEF")));
    assert!(x.is_equivalent_to(&amino("ABC.-.DEF")));
    assert!(!x.is_equivalent_to(&amino("AB----DEF")));
    assert!(!x.is_equivalent_to(&amino("ABC...DEFG")));
    assert!(!x.is_equivalent_to(&BioString::new("ABC...DEF", Grammar::Dna)));
}

#[test]
fn ungapped_and_lengths() {
    let bs = amino("--AB-.C-");
    assert_eq!(bs.ungapped(), amino("ABC"));
    assert_eq!(bs.ungapped_length(), 3);
    assert_eq!(bs.ungapped().len(), bs.ungapped_length());
    assert_eq!(bs.len(), 8);
}

#[test]
fn gap_queries() {
    let bs = amino("AB----CD");
    assert_eq!(bs.head_gaps(), 0);
    assert_eq!(bs.tail_gaps(), 0);
    assert_eq!(bs.gaps_left_of(3), 0);
    assert_eq!(bs.gaps_left_of(5), 2);
    assert_eq!(bs.gaps_left_of(7), 4);
    assert_eq!(bs.gaps_left_of(8), 0);
    assert_eq!(bs.gaps_right_of(1), 0);
    assert_eq!(bs.gaps_right_of(2), 4);
    assert_eq!(bs.gaps_right_of(5), 1);
    assert_eq!(bs.gaps_right_of(6), 0);
    assert_eq!(bs.gaps_between(ClosedRange::new(1, 8)), 4);
    assert_eq!(bs.non_gaps_between(ClosedRange::new(2, 7)), 2);

    let headed = amino("..AB--");
    assert_eq!(headed.head_gaps(), 2);
    assert_eq!(headed.tail_gaps(), 2);
    assert!(headed.has_gaps());
    assert!(headed.has_non_gaps());
    assert!(headed.has_gap_at(1));
    assert!(!headed.has_gap_at(3));
}

#[test]
fn slidable_positions() {
    let bs = amino("AB--C-D-E");
    assert_eq!(bs.left_slidable_positions(ClosedRange::new(5, 7)), 2);
    assert_eq!(bs.left_slidable_positions(ClosedRange::new(6, 6)), 5);
    assert_eq!(bs.left_slidable_positions(ClosedRange::new(3, 5)), 0);
    assert_eq!(bs.right_slidable_positions(ClosedRange::new(5, 7)), 1);
    assert_eq!(bs.right_slidable_positions(ClosedRange::new(6, 6)), 3);
    assert_eq!(bs.right_slidable_positions(ClosedRange::new(2, 4)), 0);
}

#[test]
fn slide_left_within_gaps() {
    let mut bs = amino("ABC--D-EF--GH");
    assert_eq!(bs.slide(ClosedRange::new(6, 9), -1), -1);
    assert_eq!(bs, "ABC-D-EF---GH");

    let mut bs = amino("ABC--D-EF--GH");
    assert_eq!(bs.slide(ClosedRange::new(6, 9), -2), -2);
    assert_eq!(bs, "ABCD-EF----GH");

    // Clamped at the adjacent gap count
    let mut bs = amino("ABC--D-EF--GH");
    assert_eq!(bs.slide(ClosedRange::new(6, 9), -5), -2);
    assert_eq!(bs, "ABCD-EF----GH");
}

#[test]
fn slide_right_within_gaps() {
    let mut bs = amino("ABC--D-EF--GH");
    assert_eq!(bs.slide(ClosedRange::new(9, 11), 2), 0);
    assert_eq!(bs, "ABC--D-EF--GH");

    let mut bs = amino("ABC--D-EF--GH");
    assert_eq!(bs.slide(ClosedRange::new(9, 10), 2), 1);
    assert_eq!(bs, "ABC--D-E-F-GH");
}

#[test]
fn slide_preserves_displaced_gap_identity() {
    let mut bs = amino("-.AB");
    assert_eq!(bs.slide(ClosedRange::new(3, 4), -2), -2);
    assert_eq!(bs, "AB-.");

    // Sliding back restores the original bytes exactly
    assert_eq!(bs.slide(ClosedRange::new(1, 2), 2), 2);
    assert_eq!(bs, "-.AB");
}

#[test]
fn slide_round_trip_is_identity() {
    let original = amino("ABC--D-EF--GH");
    for delta in -4isize..=4 {
        let mut bs = original.clone();
        let range = ClosedRange::new(6, 9);
        let moved = bs.slide(range, delta);
        if moved != 0 {
            let shifted = ClosedRange::new(
                (range.begin as isize + moved) as usize,
                (range.end as isize + moved) as usize,
            );
            assert_eq!(bs.slide(shifted, -moved), -moved);
        }
        assert_eq!(bs, original, "round trip failed for delta {}", delta);
    }
}

#[test]
fn collapse_left_packs_and_reports_affected_range() {
    let mut bs = amino("A-BC-D-E");
    let affected = bs.collapse_left(ClosedRange::new(1, 8));
    assert_eq!(bs, "ABCDE---");
    assert_eq!(affected, Some(ClosedRange::new(2, 8)));

    // Idempotent
    assert_eq!(bs.collapse_left(ClosedRange::new(1, 8)), None);
    assert_eq!(bs, "ABCDE---");
}

#[test]
fn collapse_right_packs_and_reports_affected_range() {
    let mut bs = amino("-AB-C");
    let affected = bs.collapse_right(ClosedRange::new(1, 5));
    assert_eq!(bs, "--ABC");
    assert_eq!(affected, Some(ClosedRange::new(2, 4)));

    assert_eq!(bs.collapse_right(ClosedRange::new(1, 5)), None);
    assert_eq!(bs, "--ABC");
}

#[test]
fn collapse_preserves_gap_identity() {
    let mut bs = amino("A.B-C");
    let affected = bs.collapse_left(ClosedRange::new(1, 5));
    // The displaced dot gap keeps its own character
    assert_eq!(bs, "ABC-.");
    assert_eq!(affected, Some(ClosedRange::new(2, 5)));
}

#[test]
fn collapse_within_subrange_only() {
    let mut bs = amino("A-BC-D-E");
    let affected = bs.collapse_left(ClosedRange::new(2, 6));
    assert_eq!(bs, "ABCD---E");
    assert_eq!(affected, Some(ClosedRange::new(2, 6)));
}

#[test]
fn insert_then_remove_gaps_is_identity() {
    let original = amino("AB-CD");
    let mut bs = original.clone();
    bs.insert_gaps(3, 4, b'-');
    assert_eq!(bs, "AB-----CD");
    bs.remove_gaps_at(3, 4);
    assert_eq!(bs, original);
}

#[test]
fn insert_positions_are_one_based() {
    let mut bs = amino("ABCDEF");
    bs.insert(1, &amino("XYZ"));
    assert_eq!(bs, "XYZABCDEF");

    let mut bs = amino("ABCDEF");
    bs.insert(6, &amino("---"));
    assert_eq!(bs, "ABCDE---F");

    let mut bs = amino("ABCDEF");
    bs.insert(7, &amino(".."));
    assert_eq!(bs, "ABCDEF..");

    let mut bs = amino("ABCDEF");
    bs.insert_gaps(1, 2, b'-');
    assert_eq!(bs, "--ABCDEF");
    bs.insert_gaps(3, 0, b'-');
    assert_eq!(bs, "--ABCDEF");
}

#[test]
fn remove_and_replace() {
    let mut bs = amino("ABCDEF");
    bs.remove(2, 3);
    assert_eq!(bs, "AEF");

    let mut bs = amino("ABCDEF");
    bs.remove_range(ClosedRange::new(1, 2));
    assert_eq!(bs, "CDEF");

    let mut bs = amino("AB--EF");
    bs.replace(3, 2, &amino("CD"));
    assert_eq!(bs, "ABCDEF");

    let mut bs = amino("A--B");
    bs.remove_gaps();
    assert_eq!(bs, "AB");
}

#[test]
fn mid_carries_grammar() {
    let bs = BioString::new("ACGT", Grammar::Dna);
    let mid = bs.mid(ClosedRange::new(2, 3));
    assert_eq!(mid, "CG");
    assert_eq!(mid.grammar(), Grammar::Dna);
}

#[test]
fn find_locates_first_occurrence() {
    let bs = amino("ABCABC");
    assert_eq!(bs.find(&amino("ABC")), Some(1));
    assert_eq!(bs.find(&amino("CA")), Some(3));
    assert_eq!(bs.find(&amino("XY")), None);
    assert_eq!(bs.find(&amino("")), None);
}

#[test]
fn complement_rules() {
    let dna = BioString::new("ABCDGHKMTV", Grammar::Dna);
    assert_eq!(dna.complement(), "TVGHCDMKAB");
    assert_eq!(BioString::new("abcdghkmtv", Grammar::Dna).complement(), "tvghcdmkab");
    // N, S and W are self-complementary
    assert_eq!(BioString::new("NSW", Grammar::Dna).complement(), "NSW");
}

#[test]
fn reverse_complement_and_palindromes() {
    let dna = BioString::new("GAATTC", Grammar::Dna);
    assert_eq!(dna.reverse_complement(), "GAATTC");
    assert!(dna.is_palindrome());

    assert!(!BioString::new("GAATT", Grammar::Dna).is_palindrome());
    assert!(!BioString::new("GA-ATTC", Grammar::Dna).is_palindrome());
    assert!(!BioString::new("", Grammar::Dna).is_palindrome());
    // Palindromes are a DNA notion
    assert!(!BioString::new("GAATTC", Grammar::Amino).is_palindrome());
}

#[test]
fn transcription_round_trip() {
    let dna = BioString::new("ACTGt", Grammar::Dna);
    let rna = dna.transcribe();
    assert_eq!(rna, "ACUGu");
    assert_eq!(rna.grammar(), Grammar::Rna);

    let back = rna.back_transcribe();
    assert_eq!(back, "ACTGt");
    assert_eq!(back.grammar(), Grammar::Dna);
}

#[test]
fn tr_map_first_wins() {
    let mut bs = amino("AXA");
    bs.tr_map(b"AaA", b"Bb@");
    assert_eq!(bs, "BXB");

    let mut bs = amino("ABAB");
    bs.tr(b'A', b'Z');
    assert_eq!(bs, "ZBZB");
}

#[test]
fn translate_gaps_unifies_gap_styles() {
    let mut bs = amino("A-.B");
    bs.translate_gaps(b'.');
    assert_eq!(bs, "A..B");
}

#[test]
fn digest_is_md5_of_content() {
    let bs = amino("ABC");
    let hex: String = bs.digest().iter().map(|b| format!("{:02x}", b)).collect();
    assert_eq!(hex, "902fbdd2b1df0c4f70b4a5d23525e932");
    // Grammar does not enter the digest
    assert_eq!(bs.digest(), BioString::new("ABC", Grammar::Dna).digest());
}
