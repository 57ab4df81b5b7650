use std::collections::{HashMap, VecDeque};

/// A small deterministic finite automaton over string tokens.
///
/// Used to carry an acceptor for each atomic predicate so that a concrete
/// example (a community string, an AS-path) can be produced from a
/// satisfying assignment. State `0` is always the start state.
#[derive(Clone, Debug)]
pub struct Dfa {
    num_states: usize,
    transitions: HashMap<(usize, String), usize>,
    accepting: Vec<usize>,
}

impl Dfa {
    pub fn new(num_states: usize, accepting: Vec<usize>) -> Dfa {
        assert!(num_states > 0);
        assert!(accepting.iter().all(|s| *s < num_states));
        Dfa {
            num_states,
            transitions: HashMap::new(),
            accepting,
        }
    }

    /// A single-state automaton accepting exactly the one given word.
    pub fn literal(tokens: &[&str]) -> Dfa {
        let mut dfa = Dfa::new(tokens.len() + 1, vec![tokens.len()]);
        for (i, token) in tokens.iter().enumerate() {
            dfa.add_transition(i, token, i + 1);
        }
        dfa
    }

    pub fn add_transition(&mut self, from: usize, token: &str, to: usize) {
        assert!(from < self.num_states && to < self.num_states);
        self.transitions.insert((from, token.to_string()), to);
    }

    pub fn accepts(&self, tokens: &[&str]) -> bool {
        let mut state = 0;
        for token in tokens {
            match self.transitions.get(&(state, (*token).to_string())) {
                Some(next) => state = *next,
                None => return false,
            }
        }
        self.accepting.contains(&state)
    }

    /// Breadth-first search for a shortest accepted token sequence, or
    /// `None` if the accepted language is empty.
    pub fn shortest_accepted_string(&self) -> Option<Vec<String>> {
        let mut predecessor: Vec<Option<(usize, &str)>> = vec![None; self.num_states];
        let mut seen = vec![false; self.num_states];
        let mut queue = VecDeque::new();
        seen[0] = true;
        queue.push_back(0);
        while let Some(state) = queue.pop_front() {
            if self.accepting.contains(&state) {
                let mut tokens = Vec::new();
                let mut current = state;
                while let Some((prev, token)) = predecessor[current] {
                    tokens.push(token.to_string());
                    current = prev;
                }
                tokens.reverse();
                return Some(tokens);
            }
            for ((from, token), to) in &self.transitions {
                if *from == state && !seen[*to] {
                    seen[*to] = true;
                    predecessor[*to] = Some((state, token));
                    queue.push_back(*to);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::Dfa;

    #[test]
    fn literal_accepts_exactly_its_word() {
        let dfa = Dfa::literal(&["65000", "65001"]);
        assert!(dfa.accepts(&["65000", "65001"]));
        assert!(!dfa.accepts(&["65000"]));
        assert!(!dfa.accepts(&["65001", "65000"]));
        assert!(!dfa.accepts(&[]));
    }

    #[test]
    fn shortest_string_prefers_fewer_tokens() {
        // Accepts "a" and "b c"; the shortest accepted word is "a".
        let mut dfa = Dfa::new(4, vec![1, 3]);
        dfa.add_transition(0, "a", 1);
        dfa.add_transition(0, "b", 2);
        dfa.add_transition(2, "c", 3);
        assert_eq!(dfa.shortest_accepted_string(), Some(vec!["a".to_string()]));
    }

    #[test]
    fn empty_language_has_no_witness() {
        let dfa = Dfa::new(2, vec![1]);
        assert_eq!(dfa.shortest_accepted_string(), None);
    }

    #[test]
    fn accepting_start_state_yields_empty_word() {
        let dfa = Dfa::new(1, vec![0]);
        assert_eq!(dfa.shortest_accepted_string(), Some(vec![]));
    }
}
