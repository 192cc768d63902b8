//! Line level grammar for Mace4 output and for ground atoms typed by users.
//! The parser in `parser.rs` decides which rule to try from its state.

peg::parser! {
    pub grammar mace4_line() for str {
        rule ws() = quiet!{[' ' | '\t' | '\r']*}

        rule number() -> usize
            = n:$(['0'..='9']+) {? n.parse().or(Err("number")) }

        rule ident() -> &'input str
            = $(['a'..='z' | 'A'..='Z' | '$'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '$']*)

        rule arity() -> usize
            = "(" ws() u:("_" ** (ws() "," ws())) ws() ")" { u.len() }

        rule bit() -> bool
            = "0" { false } / "1" { true }

        rule bits() -> Vec<bool>
            = b:(bit() ** (ws() "," ws())) ws() ","? { b }

        rule close() -> ()
            = "]" ws() ")" ws() ","? { }

        // `interpretation( 3, [number=1, seconds=0], [`
        pub rule interpretation() -> usize
            = ws() "interpretation(" ws() n:number() ws() "," [_]* { n }

        // `]).` closing an interpretation.
        pub rule interpretation_end()
            = ws() "]" ws() ")" ws() "." ws()

        // `function(a, [ 0 ]),` and `function(f(_), [ 0, 1 ]),`
        pub rule function() -> (&'input str, usize, Vec<usize>)
            = ws() "function(" ws() name:ident() a:arity()? ws() "," ws() "[" ws()
              vals:(number() ** (ws() "," ws())) ws() "]" ws() ")" ws() [',' | '.']? ws()
            { (name, a.unwrap_or(0), vals) }

        // `relation(alive(_,_), [` with the first values and the closing
        // `])` when they fit on the same line.
        pub rule relation() -> (&'input str, usize, Vec<bool>, bool)
            = ws() "relation(" ws() name:ident() a:arity()? ws() "," ws() "[" ws()
              vals:bits() ws() c:close()? ws()
            { (name, a.unwrap_or(0), vals, c.is_some()) }

        // A continuation row of a relation table.
        pub rule row() -> (Vec<bool>, bool)
            = ws() vals:bits() ws() c:close()? ws() { (vals, c.is_some()) }

        // `alive(d,n1)`, `-alive(d, n1)` or a nullary `p`.
        pub rule atom() -> (bool, &'input str, Vec<&'input str>)
            = ws() neg:("-" ws())? name:ident() ws()
              args:("(" ws() a:(ident() ** (ws() "," ws())) ws() ")" { a })? ws() "."? ws()
            { (neg.is_some(), name, args.unwrap_or_default()) }
    }
}
