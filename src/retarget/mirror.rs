use std::borrow::Cow;

/// Token pairs swapped by [`mirror_name`], in priority order
pub const MIRROR_TOKENS: [(&str, &str); 3] = [("Right", "Left"), (" L ", " R "), (".R", ".L")];

/// Name of the bone on the opposite side of the body.
///
/// The first token pair that occurs in `name` is swapped everywhere in it;
/// names containing none of the pairs (central bones) come back unchanged.
/// Applying it twice yields the original name.
pub fn mirror_name(name: &str) -> Cow<'_, str> {
    for (a, b) in MIRROR_TOKENS {
        if let Some(mirrored) = swap_tokens(name, a, b) {
            return Cow::Owned(mirrored);
        }
    }
    Cow::Borrowed(name)
}

/// Swap every occurrence of `a` with `b` and vice versa in one left-to-right
/// scan. None when neither token occurs.
fn swap_tokens(s: &str, a: &str, b: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len() + 1);
    let mut rest = s;
    let mut changed = false;

    loop {
        if let Some(tail) = rest.strip_prefix(a) {
            out.push_str(b);
            rest = tail;
            changed = true;
        } else if let Some(tail) = rest.strip_prefix(b) {
            out.push_str(a);
            rest = tail;
            changed = true;
        } else {
            let mut chars = rest.chars();
            match chars.next() {
                Some(ch) => {
                    out.push(ch);
                    rest = chars.as_str();
                }
                None => break,
            }
        }
    }

    changed.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_mirror_rules() {
        assert_eq!(mirror_name("RightUpperArm"), "LeftUpperArm");
        assert_eq!(mirror_name("LeftUpperArm"), "RightUpperArm");
        assert_eq!(mirror_name("Bip01 L Foot"), "Bip01 R Foot");
        assert_eq!(mirror_name("Hand.R"), "Hand.L");
        assert_eq!(mirror_name("Spine"), "Spine");
        assert!(matches!(mirror_name("Spine"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // Contains both a Left token and a .R token: only Left/Right is swapped
        assert_eq!(mirror_name("LeftHand.R"), "RightHand.R");
        // Both words swapped in a single pass
        assert_eq!(mirror_name("LeftToRight"), "RightToLeft");
    }

    #[test]
    fn test_mirror_is_an_involution() {
        for name in [
            "RightUpperArm",
            "Bip01 L Foot",
            "Hand.R",
            "Spine",
            "mixamorig:LeftHandIndex1",
            "Bip01 R Clavicle",
            "",
        ] {
            let once = mirror_name(name);
            assert_eq!(mirror_name(&once), name, "mirror(mirror({name:?}))");
        }
    }

    #[test]
    fn test_mirror_involution_random_names() {
        const PIECES: [&str; 10] = [
            "Right", "Left", " L ", " R ", ".R", ".L", "Arm", "Bip01", "_", "x",
        ];
        let mut rng = rand::rng();
        for _ in 0..500 {
            let len = rng.random_range(0..6);
            let name: String = (0..len)
                .map(|_| PIECES[rng.random_range(0..PIECES.len())])
                .collect();
            let twice = mirror_name(&mirror_name(&name)).into_owned();
            assert_eq!(twice, name);
        }
    }
}
